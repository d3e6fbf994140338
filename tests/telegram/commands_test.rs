//! Slash command texts.

use cupid::store::User;
use cupid::telegram::commands::{handle_admin_usage, handle_help, handle_start, who_card};

fn user(blocked: bool, user_name: Option<&str>) -> User {
    User {
        id: 3,
        external_id: 42,
        full_name: "Alex <Doe>".to_owned(),
        user_name: user_name.map(str::to_owned),
        phone: "+15550100".to_owned(),
        blocked,
        blocked_reason: if blocked { "spam".to_owned() } else { String::new() },
    }
}

#[test]
fn start_links_channel_when_configured() {
    let with_link = handle_start(Some("https://t.me/valentines"));
    assert!(with_link.contains("<a href=\"https://t.me/valentines\">"));

    let without = handle_start(None);
    assert!(!without.contains("<a href"));
    assert!(without.contains("/help"));
}

#[test]
fn help_mentions_cooldown_and_disclaimer() {
    let help = handle_help(15);
    assert!(help.contains("/valentine"));
    assert!(help.contains("/cancel"));
    assert!(help.contains("every 15 minutes"));
    assert!(help.contains("Disclaimer"));
}

#[test]
fn who_card_escapes_and_reports_status() {
    let card = who_card(&user(true, Some("alex")), 3);
    assert!(card.contains("Username: @alex"));
    assert!(card.contains("Name: Alex &lt;Doe&gt;"));
    assert!(card.contains("https://t.me/+15550100"));
    assert!(card.contains("Blocked: yes (spam)"));
    assert!(card.contains("Valentines sent: 3"));
}

#[test]
fn who_card_without_username() {
    let card = who_card(&user(false, None), 0);
    assert!(card.contains("Username: no username"));
    assert!(card.contains("Blocked: no"));
}

#[test]
fn admin_usage_names_both_commands() {
    let usage = handle_admin_usage();
    assert!(usage.contains("/who"));
    assert!(usage.contains("/block"));
}
