use crate::{
    auth::AuthUser,
    entities::{testimonial, Testimonial, TestimonialModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct TestimonialService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTestimonialInput {
    /// Defaults to the signed-in user's display name.
    #[validate(length(min = 1, max = 100))]
    pub author_name: Option<String>,
    #[validate(length(max = 100))]
    pub author_role: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

impl TestimonialService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub async fn list(&self) -> Result<Vec<TestimonialModel>, ServiceError> {
        Ok(Testimonial::find()
            .order_by_desc(testimonial::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, author, input), fields(author = %author.user_id))]
    pub async fn create(
        &self,
        author: &AuthUser,
        input: CreateTestimonialInput,
    ) -> Result<TestimonialModel, ServiceError> {
        input.validate()?;

        let testimonial = testimonial::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(Some(author.user_id.clone())),
            author_name: Set(input.author_name.unwrap_or_else(|| author.display_name())),
            author_role: Set(input.author_role),
            body: Set(input.body),
            created_at: Set(Utc::now()),
        };
        let testimonial = testimonial.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::TestimonialCreated(testimonial.id))
            .await;
        Ok(testimonial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::migrated_sqlite;
    use assert_matches::assert_matches;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn author_name_falls_back_to_token_name() {
        let db = Arc::new(migrated_sqlite().await);
        let (tx, _rx) = mpsc::channel(8);
        let svc = TestimonialService::new(db, Arc::new(EventSender::new(tx)));
        let author = AuthUser {
            user_id: "user-9".into(),
            name: Some("Grace".into()),
            email: None,
            roles: vec![],
        };

        let created = svc
            .create(
                &author,
                CreateTestimonialInput {
                    author_name: None,
                    author_role: Some("Photographer".into()),
                    body: "Fast shipping, sturdy cases.".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.author_name, "Grace");
        assert_eq!(svc.list().await.unwrap().len(), 1);

        assert_matches!(
            svc.create(
                &author,
                CreateTestimonialInput {
                    author_name: None,
                    author_role: None,
                    body: String::new(),
                },
            )
            .await,
            Err(ServiceError::InvalidArgument(_))
        );
    }
}
