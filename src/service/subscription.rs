//! Subscription service
//!
//! Toggles a subscriber -> channel edge and derives subscriber and channel
//! lists. The lookup-then-act toggle is not atomic against concurrent
//! callers; the store's unique index on (subscriber, channel) is what
//! guarantees at most one edge, and an insert conflict is taken as the
//! signal to run the unsubscribe path instead.

use std::sync::Arc;

use crate::data::{Database, EntityId, Subscription, User, UserSummary};
use crate::error::AppError;

/// Outcome of a toggle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionToggle {
    Subscribed(Subscription),
    Unsubscribed,
}

/// Subscription service
pub struct SubscriptionService {
    db: Arc<Database>,
}

impl SubscriptionService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Subscribe if no edge exists, unsubscribe if one does.
    pub async fn toggle(
        &self,
        subscriber: &User,
        channel_id: &str,
    ) -> Result<SubscriptionToggle, AppError> {
        let channel_id = EntityId::parse(channel_id)?;

        if !self.db.user_exists(channel_id.as_str()).await? {
            return Err(AppError::NotFound("channel not found".to_string()));
        }

        if let Some(existing) = self
            .db
            .find_subscription(&subscriber.id, channel_id.as_str())
            .await?
        {
            self.db.delete_subscription(&existing.id).await?;
            return Ok(SubscriptionToggle::Unsubscribed);
        }

        let edge = Subscription {
            id: EntityId::generate().as_str().to_string(),
            subscriber_id: subscriber.id.clone(),
            channel_id: channel_id.as_str().to_string(),
            created_at: chrono::Utc::now(),
        };

        match self.db.insert_subscription(&edge).await {
            Ok(()) => Ok(SubscriptionToggle::Subscribed(edge)),
            Err(AppError::Conflict(_)) => {
                // Lost the race: a concurrent toggle inserted the edge first.
                // The conflict is the "already subscribed" signal, so this
                // call unsubscribes.
                if let Some(existing) = self
                    .db
                    .find_subscription(&subscriber.id, channel_id.as_str())
                    .await?
                {
                    self.db.delete_subscription(&existing.id).await?;
                }
                Ok(SubscriptionToggle::Unsubscribed)
            }
            Err(e) => Err(e),
        }
    }

    /// Projected identities of everyone subscribed to a channel.
    ///
    /// An unknown channel is `NotFound`; a channel nobody subscribes to
    /// returns an empty list.
    pub async fn list_subscribers(&self, channel_id: &str) -> Result<Vec<UserSummary>, AppError> {
        let channel_id = EntityId::parse(channel_id)?;

        if !self.db.user_exists(channel_id.as_str()).await? {
            return Err(AppError::NotFound("channel not found".to_string()));
        }

        self.db.list_channel_subscribers(channel_id.as_str()).await
    }

    /// Projected identities of every channel a user subscribes to.
    pub async fn list_subscribed_channels(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<UserSummary>, AppError> {
        let subscriber_id = EntityId::parse(subscriber_id)?;

        if !self.db.user_exists(subscriber_id.as_str()).await? {
            return Err(AppError::NotFound("user not found".to_string()));
        }

        self.db
            .list_subscribed_channels(subscriber_id.as_str())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    async fn setup() -> (SubscriptionService, Arc<Database>, User, User, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );

        let subscriber = User {
            id: EntityId::generate().as_str().to_string(),
            username: "viewer".to_string(),
            email: "viewer@example.com".to_string(),
            full_name: "Vera Viewer".to_string(),
            avatar: String::new(),
            created_at: Utc::now(),
        };
        let channel = User {
            id: EntityId::generate().as_str().to_string(),
            username: "creator".to_string(),
            email: "creator@example.com".to_string(),
            full_name: "Chris Creator".to_string(),
            avatar: String::new(),
            created_at: Utc::now(),
        };
        db.insert_user(&subscriber).await.unwrap();
        db.insert_user(&channel).await.unwrap();

        (
            SubscriptionService::new(db.clone()),
            db,
            subscriber,
            channel,
            temp_dir,
        )
    }

    #[tokio::test]
    async fn toggle_is_a_true_toggle() {
        let (service, db, subscriber, channel, _tmp) = setup().await;

        let first = service.toggle(&subscriber, &channel.id).await.unwrap();
        assert!(matches!(first, SubscriptionToggle::Subscribed(_)));

        let second = service.toggle(&subscriber, &channel.id).await.unwrap();
        assert_eq!(second, SubscriptionToggle::Unsubscribed);

        // Back to the original absence state
        assert!(db
            .find_subscription(&subscriber.id, &channel.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn toggle_rejects_malformed_channel_id() {
        let (service, _db, subscriber, _channel, _tmp) = setup().await;

        let error = service.toggle(&subscriber, "nope").await.unwrap_err();
        assert!(matches!(error, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn toggle_unknown_channel_is_not_found() {
        let (service, _db, subscriber, _channel, _tmp) = setup().await;

        let error = service
            .toggle(&subscriber, "64fa0c2b9d3e4a71c08b5f12")
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn listings_project_identities_both_ways() {
        let (service, _db, subscriber, channel, _tmp) = setup().await;

        service.toggle(&subscriber, &channel.id).await.unwrap();

        let subscribers = service.list_subscribers(&channel.id).await.unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].username, "viewer");

        let channels = service
            .list_subscribed_channels(&subscriber.id)
            .await
            .unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].username, "creator");
    }

    #[tokio::test]
    async fn empty_listings_do_not_error() {
        let (service, _db, subscriber, channel, _tmp) = setup().await;

        assert!(service
            .list_subscribers(&channel.id)
            .await
            .unwrap()
            .is_empty());
        assert!(service
            .list_subscribed_channels(&subscriber.id)
            .await
            .unwrap()
            .is_empty());
    }
}
