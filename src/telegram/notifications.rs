use teloxide::prelude::*;
use teloxide::types::{ParseMode, User};

/// Describes a sender for logs and admin copies.
pub fn sender_name(user: &User) -> String {
    match &user.last_name {
        Some(last) => format!("{} {}", user.first_name, last),
        None => user.first_name.clone(),
    }
}

/// Header sent to the admin ahead of a forwarded message.
pub fn admin_copy_header(user: &User) -> String {
    format!(
        "<b>From: {} (@{}) ID: <code>{}</code></b>",
        html_escape(&user.first_name),
        user.username.as_deref().unwrap_or("-"),
        user.id.0
    )
}

/// Copies go out for plain (non-command) messages from chats that are not admins.
pub fn should_copy_to_admin(text: Option<&str>, chat_is_admin: bool) -> bool {
    match text {
        Some(text) => !chat_is_admin && !text.starts_with('/'),
        None => false,
    }
}

/// Sends the sender header and a forward of `msg` to `admin`.
///
/// Failures are logged; they never affect the handling of the message.
pub async fn copy_to_admin(bot: Bot, admin: ChatId, msg: Message) {
    let Some(user) = msg.from.as_ref() else {
        return;
    };

    if let Err(e) = bot
        .send_message(admin, admin_copy_header(user))
        .parse_mode(ParseMode::Html)
        .await
    {
        log::warn!("Failed to send admin copy header for chat {}: {}", msg.chat.id.0, e);
        return;
    }

    if let Err(e) = bot.forward_message(admin, msg.chat.id, msg.id).await {
        log::warn!(
            "Failed to forward message {} from chat {} to admin: {}",
            msg.id.0,
            msg.chat.id.0,
            e
        );
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::UserId;

    fn user(last_name: Option<&str>, username: Option<&str>) -> User {
        User {
            id: UserId(42),
            is_bot: false,
            first_name: "Ann <3".to_string(),
            last_name: last_name.map(str::to_string),
            username: username.map(str::to_string),
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        }
    }

    #[test]
    fn test_sender_name() {
        assert_eq!(sender_name(&user(None, None)), "Ann <3");
        assert_eq!(sender_name(&user(Some("Lee"), None)), "Ann <3 Lee");
    }

    #[test]
    fn test_admin_copy_header() {
        assert_eq!(
            admin_copy_header(&user(None, Some("ann"))),
            "<b>From: Ann &lt;3 (@ann) ID: <code>42</code></b>"
        );
    }

    #[test]
    fn test_should_copy_to_admin() {
        assert!(should_copy_to_admin(Some("https://streamtape.com/v/abc"), false));
        assert!(!should_copy_to_admin(Some("/start"), false));
        assert!(!should_copy_to_admin(Some("hello"), true));
        assert!(!should_copy_to_admin(None, false));
    }
}
