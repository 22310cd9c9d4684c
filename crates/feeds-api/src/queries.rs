use feeds_core::{FeedsError, Result, Transport};
use feeds_types::api::Reply;
use feeds_types::{QueryCriteria, Statistics, UserInfo};

use crate::FeedsService;

impl<T: Transport> FeedsService<T> {
    pub fn get_channels(&self, criteria: &QueryCriteria) -> Result<Reply> {
        let channels = self.db.get_channels(criteria)?;
        Ok(Reply::Channels { channels })
    }

    /// Served from the channel registry rather than the database.
    pub fn get_channel_detail(&self, id: u64) -> Result<Reply> {
        self.hub
            .channel(id)
            .map(|info| Reply::Channel(info.clone()))
            .ok_or_else(|| FeedsError::not_exist(format!("channel {id}")))
    }

    pub fn get_subscribed_channels(&self, user: &UserInfo, criteria: &QueryCriteria) -> Result<Reply> {
        let channels = self.db.get_subscribed_channels(user.uid, criteria)?;
        Ok(Reply::Channels { channels })
    }

    pub fn get_posts(&self, channel_id: u64, criteria: &QueryCriteria) -> Result<Reply> {
        self.require_channel(channel_id)?;
        let posts = self.db.get_posts(channel_id, criteria)?;
        Ok(Reply::Posts { posts })
    }

    pub fn get_comments(&self, channel_id: u64, post_id: u64, criteria: &QueryCriteria) -> Result<Reply> {
        self.require_channel(channel_id)?;
        if self.db.get_post(channel_id, post_id)?.is_none() {
            return Err(FeedsError::not_exist(format!("post {channel_id}/{post_id}")));
        }
        let comments = self.db.get_comments(channel_id, post_id, criteria)?;
        Ok(Reply::Comments { comments })
    }

    pub fn get_liked_posts(&self, user: &UserInfo, criteria: &QueryCriteria) -> Result<Reply> {
        let posts = self.db.get_liked_posts(user.uid, criteria)?;
        Ok(Reply::Posts { posts })
    }

    /// Connected clients are the peers with notifications enabled.
    pub fn get_statistics(&self) -> Result<Reply> {
        Ok(Reply::Statistics(Statistics {
            did: self.service_did.clone(),
            connecting_clients: self.hub.registry().destinations().len() as u64,
            total_clients: self.db.count_users()?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use feeds_types::events::{Call, Notification};
    use feeds_types::{QueryCriteria, QueryField};

    use crate::testing::Harness;

    #[test]
    fn post_listing_honours_criteria() {
        let mut h = Harness::new();
        let chan = h.create_channel("tech");
        for text in [b"a", b"b", b"c", b"d"] {
            h.publish(chan, text);
        }

        let posts = h.owner_ok("N0", Call::GetPosts {
            channel_id: chan,
            criteria: QueryCriteria {
                by: QueryField::Id,
                upper: 3,
                lower: 0,
                max_count: 2,
            },
        });
        let ids: Vec<_> = posts["posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["post_id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 2]);

        let missing = h.owner_call("N0", Call::GetPosts {
            channel_id: 8,
            criteria: QueryCriteria::default(),
        });
        assert_eq!(Harness::error_code(&missing), Some("NOT_EXIST"));
    }

    #[test]
    fn subscribed_channels_are_per_user() {
        let mut h = Harness::new();
        let tech = h.create_channel("tech");
        h.create_channel("news");
        let u = h.token("u");
        h.ok("N1", &u, Call::SubscribeChannel { id: tech });

        let mine = h.ok("N1", &u, Call::GetSubscribedChannels {
            criteria: QueryCriteria::default(),
        });
        assert_eq!(mine["channels"].as_array().unwrap().len(), 1);
        assert_eq!(mine["channels"][0]["name"], "tech");

        let all = h.ok("N1", &u, Call::GetChannels {
            criteria: QueryCriteria::default(),
        });
        assert_eq!(all["channels"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn first_sign_in_broadcasts_statistics() {
        let mut h = Harness::new();
        h.owner_ok("N0", Call::EnableNotification);
        let u = h.token("u");

        let stats = h.ok("N1", &u, Call::GetStatistics);
        assert_eq!(stats["did"], "did:elastos:owner");
        assert_eq!(stats["total_clients"], 2);
        assert_eq!(stats["connecting_clients"], 1);

        // Known users do not trigger another broadcast.
        h.ok("N1", &u, Call::GetStatistics);
        let broadcasts: Vec<_> = h
            .notifications("N0")
            .into_iter()
            .filter(|n| matches!(n, Notification::StatisticsChanged { .. }))
            .collect();
        assert_eq!(broadcasts, vec![Notification::StatisticsChanged { total_clients: 2 }]);
    }
}
