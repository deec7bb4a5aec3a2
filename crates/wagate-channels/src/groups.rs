//! Group chat resolution by explicit id or display name.

use tracing::debug;
use wagate_core::{
    error::GatewayError, formatter::Recipient, message::Chat, traits::MessagingClient,
};

/// Find the first group chat whose name equals `name`, ignoring case.
///
/// Several groups may share a name; the first one listed by the client wins.
pub async fn find_group_by_name(
    client: &dyn MessagingClient,
    name: &str,
) -> Result<Option<Chat>, GatewayError> {
    let wanted = name.trim().to_lowercase();
    let chats = client.get_chats().await?;
    debug!("searching {} chats for group '{wanted}'", chats.len());
    Ok(chats
        .into_iter()
        .find(|chat| chat.is_group && chat.name.to_lowercase() == wanted))
}

/// Resolve a group recipient. An explicit id is used directly; otherwise the
/// group is looked up by name.
pub async fn resolve_group(
    client: &dyn MessagingClient,
    id: Option<&str>,
    name: Option<&str>,
) -> Result<Recipient, GatewayError> {
    if let Some(id) = id.filter(|id| !id.trim().is_empty()) {
        return Ok(Recipient::group(id));
    }

    let name = name.unwrap_or_default();
    match find_group_by_name(client, name).await? {
        Some(chat) => Ok(Recipient::Group(chat.id)),
        None => Err(GatewayError::GroupNotFound(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClient;

    fn chats() -> Vec<Chat> {
        vec![
            Chat {
                id: "5511999887766@c.us".into(),
                name: "Family".into(),
                is_group: false,
            },
            Chat {
                id: "111@g.us".into(),
                name: "Family".into(),
                is_group: true,
            },
            Chat {
                id: "222@g.us".into(),
                name: "family".into(),
                is_group: true,
            },
        ]
    }

    #[tokio::test]
    async fn test_name_match_ignores_case_and_skips_individuals() {
        let client = FakeClient::new().with_chats(chats());
        let found = find_group_by_name(&client, "FAMILY").await.unwrap().unwrap();
        assert_eq!(found.id, "111@g.us");
    }

    #[tokio::test]
    async fn test_no_match() {
        let client = FakeClient::new().with_chats(chats());
        assert!(find_group_by_name(&client, "Work").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_explicit_id_skips_lookup() {
        let client = FakeClient::new();
        let r = resolve_group(&client, Some("999"), Some("ignored"))
            .await
            .unwrap();
        assert_eq!(r.id(), "999@g.us");
        assert_eq!(client.count_calls("get_chats"), 0);
    }

    #[tokio::test]
    async fn test_resolve_by_name() {
        let client = FakeClient::new().with_chats(chats());
        let r = resolve_group(&client, None, Some("family")).await.unwrap();
        assert_eq!(r, Recipient::Group("111@g.us".into()));
    }

    #[tokio::test]
    async fn test_resolve_not_found_names_the_group() {
        let client = FakeClient::new().with_chats(chats());
        let err = resolve_group(&client, Some(""), Some("Work"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::GroupNotFound(ref n) if n == "Work"));
    }
}
