//! Request handling for the feeds service: access-token resolution, authorization, content
//! mutations that write the database before fanning out, and read-side queries.

pub mod auth;
pub mod channels;
pub mod comments;
pub mod likes;
pub mod posts;
pub mod queries;
pub mod subscriptions;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use feeds_core::{FeedsError, FeedsHub, Result, Transport};
use feeds_db::Database;
use feeds_types::UserInfo;
use feeds_types::api::Reply;
use feeds_types::events::{Call, Request, Response};

use crate::auth::Authenticator;

pub struct ServiceConfig {
    pub jwt_secret: String,
    pub owner_did: String,
    pub owner_name: String,
    /// DID reported by `get_statistics`.
    pub service_did: String,
}

pub struct FeedsService<T> {
    db: Arc<Database>,
    auth: Authenticator,
    hub: FeedsHub<Arc<Database>, T>,
    service_did: String,
}

impl<T: Transport> FeedsService<T> {
    /// Seed the owner and mirror the stored channels into a fresh registry.
    pub fn new(db: Arc<Database>, transport: T, config: ServiceConfig) -> anyhow::Result<Self> {
        db.ensure_owner(&config.owner_did, &config.owner_name)?;
        let hub = FeedsHub::bootstrap(db.clone(), transport)?;

        Ok(Self {
            db,
            auth: Authenticator::new(&config.jwt_secret),
            hub,
            service_did: config.service_did,
        })
    }

    pub fn hub(&self) -> &FeedsHub<Arc<Database>, T> {
        &self.hub
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    /// Run one request from `node_id` to completion.
    pub fn handle(&mut self, node_id: &str, req: Request) -> Response {
        let method = req.call.method();
        match self.dispatch(node_id, &req.access_token, req.call) {
            Ok(reply) => Response::ok(req.id, &reply),
            Err(e) => {
                match &e {
                    FeedsError::Internal(err) => error!("{} from [{}] failed: {:#}", method, node_id, err),
                    _ => debug!("{} from [{}] rejected: {}", method, node_id, e),
                }
                Response::err(req.id, e.code(), e.to_string())
            }
        }
    }

    /// Peer `node_id` is gone.
    pub fn disconnected(&mut self, node_id: &str) {
        let torn_down = self.hub.deactivate(node_id);
        if torn_down > 0 {
            info!("Node [{}] left, {} subscribers went inactive", node_id, torn_down);
        }
    }

    fn dispatch(&mut self, node_id: &str, token: &str, call: Call) -> Result<Reply> {
        let user = self.resolve_access_token(token)?;

        match call {
            Call::CreateChannel { name, intro, avatar } => self.create_channel(&user, name, intro, avatar),
            Call::UpdateChannel { id, name, intro, avatar } => {
                self.update_channel(&user, id, name, intro, avatar)
            }
            Call::PublishPost { channel_id, content } => self.publish_post(&user, channel_id, content),
            Call::EditPost {
                channel_id,
                post_id,
                content,
            } => self.edit_post(&user, channel_id, post_id, content),
            Call::DeletePost { channel_id, post_id } => self.delete_post(&user, channel_id, post_id),
            Call::PostComment {
                channel_id,
                post_id,
                comment_id,
                content,
            } => self.post_comment(&user, channel_id, post_id, comment_id, content),
            Call::EditComment {
                channel_id,
                post_id,
                id,
                content,
            } => self.edit_comment(&user, channel_id, post_id, id, content),
            Call::DeleteComment { channel_id, post_id, id } => {
                self.delete_comment(&user, channel_id, post_id, id)
            }
            Call::BlockComment {
                channel_id,
                post_id,
                comment_id,
            } => self.block_comment(&user, channel_id, post_id, comment_id, true),
            Call::UnblockComment {
                channel_id,
                post_id,
                comment_id,
            } => self.block_comment(&user, channel_id, post_id, comment_id, false),
            Call::PostLike {
                channel_id,
                post_id,
                comment_id,
            } => self.post_like(&user, channel_id, post_id, comment_id),
            Call::PostUnlike {
                channel_id,
                post_id,
                comment_id,
            } => self.post_unlike(&user, channel_id, post_id, comment_id),
            Call::ReportIllegalComment {
                channel_id,
                post_id,
                comment_id,
                reasons,
            } => self.report_illegal_comment(&user, channel_id, post_id, comment_id, reasons),
            Call::GetChannels { criteria } => self.get_channels(&criteria),
            Call::GetChannelDetail { id } => self.get_channel_detail(id),
            Call::GetSubscribedChannels { criteria } => self.get_subscribed_channels(&user, &criteria),
            Call::GetPosts { channel_id, criteria } => self.get_posts(channel_id, &criteria),
            Call::GetComments {
                channel_id,
                post_id,
                criteria,
            } => self.get_comments(channel_id, post_id, &criteria),
            Call::GetLikedPosts { criteria } => self.get_liked_posts(&user, &criteria),
            Call::GetStatistics => self.get_statistics(),
            Call::SubscribeChannel { id } => self.subscribe_channel(&user, id),
            Call::UnsubscribeChannel { id } => self.unsubscribe_channel(&user, id),
            Call::EnableNotification => self.enable_notification(&user, node_id),
        }
    }

    /// Verify the token and map its DID to a user row. A user seen for the first time
    /// changes the registered user count, which every connected peer is told about.
    pub fn resolve_access_token(&self, token: &str) -> Result<UserInfo> {
        let claims = self.auth.verify(token)?;
        let (user, created) = self.db.get_or_create_user(&claims.sub, &claims.name, &claims.email)?;

        if created {
            if let Err(e) = self.hub.broadcast_statistics() {
                warn!("Failed to broadcast statistics: {}", e);
            }
        }
        Ok(user)
    }

    fn require_owner(&self, user: &UserInfo) -> Result<()> {
        if user.is_owner() {
            Ok(())
        } else {
            Err(FeedsError::not_authorized(format!("user {} is not the owner", user.uid)))
        }
    }

    fn require_channel(&self, channel_id: u64) -> Result<()> {
        if self.hub.registry().channels().exists_by_id(channel_id) {
            Ok(())
        } else {
            Err(FeedsError::not_exist(format!("channel {channel_id}")))
        }
    }
}
