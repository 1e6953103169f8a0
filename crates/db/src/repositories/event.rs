//! Session event log: the audit trail and the notification feed.
//!
//! Rows are append-only; only the read flag changes afterwards.

use chrono::Utc;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set,
};
use uuid::Uuid;

use classplan_core::notification::NotificationEvent;
use classplan_shared::types::PageRequest;

use crate::entities::{sea_orm_active_enums::RecipientRole, session_events, sessions};

/// Whose feed is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Events addressed to provider staff.
    Staff,
    /// Events addressed to a school, for that school's sessions.
    School(Uuid),
    /// Events addressed to a trainer, for sessions assigned to them.
    Trainer(Uuid),
}

impl FeedScope {
    fn condition(self) -> Condition {
        let addressed_to = |role: RecipientRole| session_events::Column::Recipient.eq(role);
        let sessions_where = |filter: SimpleExpr| {
            session_events::Column::SessionId.in_subquery(
                sessions::Entity::find()
                    .select_only()
                    .column(sessions::Column::Id)
                    .filter(filter)
                    .into_query(),
            )
        };

        match self {
            Self::Staff => Condition::all().add(addressed_to(RecipientRole::Staff)),
            Self::School(school_id) => Condition::all()
                .add(addressed_to(RecipientRole::School))
                .add(sessions_where(sessions::Column::SchoolId.eq(school_id))),
            Self::Trainer(trainer_id) => Condition::all()
                .add(addressed_to(RecipientRole::Trainer))
                .add(sessions_where(sessions::Column::TrainerId.eq(trainer_id))),
        }
    }
}

/// Appends an event using the given connection or transaction.
pub(crate) async fn insert_event<C: ConnectionTrait>(
    conn: &C,
    event: &NotificationEvent,
) -> Result<session_events::Model, DbErr> {
    let row = session_events::ActiveModel {
        id: Set(Uuid::now_v7()),
        session_id: Set(event.session_id.into_inner()),
        kind: Set(event.kind.into()),
        actor: Set(event.actor),
        recipient: Set(event.recipient.into()),
        message: Set(event.message.clone()),
        payload: Set(event.payload.clone()),
        is_read: Set(false),
        created_at: Set(Utc::now().into()),
    };
    row.insert(conn).await
}

/// Event repository.
#[derive(Debug, Clone)]
pub struct EventRepository {
    db: DatabaseConnection,
}

impl EventRepository {
    /// Creates a new event repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an event.
    pub async fn append(&self, event: &NotificationEvent) -> Result<session_events::Model, DbErr> {
        insert_event(&self.db, event).await
    }

    /// Audit trail of a session, oldest first.
    pub async fn list_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<session_events::Model>, DbErr> {
        session_events::Entity::find()
            .filter(session_events::Column::SessionId.eq(session_id))
            .order_by_asc(session_events::Column::CreatedAt)
            .order_by_asc(session_events::Column::Id)
            .all(&self.db)
            .await
    }

    /// Feed of a recipient, newest first.
    pub async fn list_for_recipient(
        &self,
        scope: FeedScope,
        unread_only: bool,
        page: &PageRequest,
    ) -> Result<(Vec<session_events::Model>, u64), DbErr> {
        let mut query = session_events::Entity::find().filter(scope.condition());
        if unread_only {
            query = query.filter(session_events::Column::IsRead.eq(false));
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(session_events::Column::CreatedAt)
            .order_by_desc(session_events::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    /// Unread events of a recipient.
    pub async fn unread_count(&self, scope: FeedScope) -> Result<u64, DbErr> {
        session_events::Entity::find()
            .filter(scope.condition())
            .filter(session_events::Column::IsRead.eq(false))
            .count(&self.db)
            .await
    }

    /// Marks one event read. Returns false if it is not in the scope's feed.
    pub async fn mark_read(&self, scope: FeedScope, event_id: Uuid) -> Result<bool, DbErr> {
        let result = session_events::Entity::update_many()
            .col_expr(session_events::Column::IsRead, Expr::value(true))
            .filter(session_events::Column::Id.eq(event_id))
            .filter(scope.condition())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Marks every event of the scope's feed read.
    pub async fn mark_all_read(&self, scope: FeedScope) -> Result<u64, DbErr> {
        let result = session_events::Entity::update_many()
            .col_expr(session_events::Column::IsRead, Expr::value(true))
            .filter(session_events::Column::IsRead.eq(false))
            .filter(scope.condition())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
