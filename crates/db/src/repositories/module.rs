//! Module repository: the training catalog.

use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgBinOper;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use classplan_core::catalog::{CatalogError, ModuleContent};
use classplan_shared::types::PageRequest;

use crate::entities::{modules, sessions};

/// Attempts at finding a free code for a duplicate before giving up.
const MAX_COPY_ATTEMPTS: u32 = 50;

/// Error types for module operations.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// Module not found.
    #[error("Module not found: {0}")]
    NotFound(Uuid),

    /// Module code already exists.
    #[error("Module code '{0}' already exists")]
    DuplicateCode(String),

    /// Content breaks a catalog rule.
    #[error(transparent)]
    Invalid(#[from] CatalogError),

    /// The module is used by sessions.
    #[error("Cannot delete module: it is used by {0} sessions")]
    InUse(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Filter for listing modules.
#[derive(Debug, Clone, Default)]
pub struct ModuleFilter {
    /// Only active (or inactive) modules.
    pub is_active: Option<bool>,
    /// Modules tagged with this category.
    pub category: Option<String>,
    /// Modules tagged with this skill.
    pub skill: Option<String>,
}

/// Module repository.
#[derive(Debug, Clone)]
pub struct ModuleRepository {
    db: DatabaseConnection,
}

impl ModuleRepository {
    /// Creates a new module repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a module from validated content.
    pub async fn create(&self, mut content: ModuleContent) -> Result<modules::Model, ModuleError> {
        content.normalize_terms();
        content.validate()?;
        self.ensure_code_free(&content.code, None).await?;

        let module = self.insert(content).await?;
        info!(module_id = %module.id, code = %module.code, "Module created");
        Ok(module)
    }

    /// Finds a module by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<modules::Model, ModuleError> {
        modules::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ModuleError::NotFound(id))
    }

    /// Lists modules ordered by code.
    pub async fn list(
        &self,
        filter: &ModuleFilter,
        page: &PageRequest,
    ) -> Result<(Vec<modules::Model>, u64), ModuleError> {
        let mut query = modules::Entity::find();

        if let Some(active) = filter.is_active {
            query = query.filter(modules::Column::IsActive.eq(active));
        }
        if let Some(category) = normalized_term(filter.category.as_deref()) {
            query = query.filter(
                Expr::col(modules::Column::Categories)
                    .binary(PgBinOper::Contains, Expr::val(vec![category])),
            );
        }
        if let Some(skill) = normalized_term(filter.skill.as_deref()) {
            query = query.filter(
                Expr::col(modules::Column::Skills)
                    .binary(PgBinOper::Contains, Expr::val(vec![skill])),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_asc(modules::Column::Code)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    /// Replaces the content of a module.
    pub async fn update(
        &self,
        id: Uuid,
        mut content: ModuleContent,
    ) -> Result<modules::Model, ModuleError> {
        content.normalize_terms();
        content.validate()?;

        let module = self.find_by_id(id).await?;
        if module.code != content.code {
            self.ensure_code_free(&content.code, Some(id)).await?;
        }

        let mut active: modules::ActiveModel = module.into();
        set_content(&mut active, content);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a module no session refers to.
    pub async fn delete(&self, id: Uuid) -> Result<(), ModuleError> {
        let module = self.find_by_id(id).await?;

        let used = sessions::Entity::find()
            .filter(sessions::Column::ModuleId.eq(id))
            .count(&self.db)
            .await?;
        if used > 0 {
            return Err(ModuleError::InUse(used));
        }

        modules::Entity::delete_by_id(module.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Deep-copies a module into a new, inactive one.
    ///
    /// If the suffixed code is taken, a counter is appended
    /// (`PY-101-copy`, `PY-101-copy-2`, ...). The original row is only read.
    pub async fn duplicate(&self, id: Uuid) -> Result<modules::Model, ModuleError> {
        let original = self.find_by_id(id).await?;
        let mut copy = original.content().duplicate();

        let base = copy.code.clone();
        let mut attempt = 1;
        while self.code_exists(&copy.code).await? {
            attempt += 1;
            if attempt > MAX_COPY_ATTEMPTS {
                return Err(ModuleError::DuplicateCode(base));
            }
            copy.code = format!("{base}-{attempt}");
        }
        copy.validate()?;

        let module = self.insert(copy).await?;
        info!(
            module_id = %module.id,
            source_id = %original.id,
            code = %module.code,
            "Module duplicated"
        );
        Ok(module)
    }

    async fn insert(&self, content: ModuleContent) -> Result<modules::Model, DbErr> {
        let now = Utc::now().into();
        let mut module = modules::ActiveModel {
            id: Set(Uuid::now_v7()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        set_content(&mut module, content);
        module.insert(&self.db).await
    }

    async fn code_exists(&self, code: &str) -> Result<bool, DbErr> {
        let count = modules::Entity::find()
            .filter(modules::Column::Code.eq(code))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn ensure_code_free(&self, code: &str, except: Option<Uuid>) -> Result<(), ModuleError> {
        let mut query = modules::Entity::find().filter(modules::Column::Code.eq(code));
        if let Some(id) = except {
            query = query.filter(modules::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(ModuleError::DuplicateCode(code.to_string()));
        }
        Ok(())
    }
}

fn normalized_term(term: Option<&str>) -> Option<String> {
    term.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty())
}

fn set_content(active: &mut modules::ActiveModel, content: ModuleContent) {
    active.code = Set(content.code);
    active.title = Set(content.title);
    active.description = Set(content.description);
    active.duration_hours = Set(content.duration_hours);
    active.pricing_type = Set(content.pricing_type.into());
    active.price = Set(content.price);
    active.objectives = Set(content.objectives);
    active.prerequisites = Set(content.prerequisites);
    active.rncp_code = Set(content.rncp_code);
    active.metadata = Set(content.metadata);
    active.skills = Set(content.skills);
    active.categories = Set(content.categories);
    active.is_active = Set(content.is_active);
}
