use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::error::RepoResult;
use crate::models::{
    Apprenant, ApprenantFilter, Article, ArticleFilter, DashboardStats, FormationFilter,
    FormationPersonnalisee, Media, MediaFilter, Page, PageRequest, Programme, ProgrammeFilter,
    RendezVous, RendezVousFilter, StoredUser, User,
};

mod memory;
mod mongo;

pub use memory::InMemoryRepository;
pub use mongo::MongoRepository;

/// Collection names shared by both implementations.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PROGRAMMES: &str = "programmes";
    pub const FORMATIONS: &str = "formations_personnalisees";
    pub const APPRENANTS: &str = "apprenants";
    pub const RENDEZ_VOUS: &str = "rendez-vous";
    pub const ARTICLES: &str = "articles";
    pub const MEDIA: &str = "media";
}

/// Duplicate field reported when the bootstrap account already exists.
pub const FIRST_USER: &str = "first_user";

/// Repository Trait
///
/// The persistence contract used by every handler. Two implementations exist:
/// `MongoRepository` (the production store) and `InMemoryRepository` (local
/// development without a database, and the test double).
///
/// Conventions shared by all record types:
/// - ids that are not valid ObjectIds simply match nothing (`None` / `false`);
/// - `insert_*` and `replace_*` enforce the unique fields of the collection and
///   fail with `RepoError::Duplicate`;
/// - `replace_*` and `delete_*` return `false` when no record has that id.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Round-trip to the store; fails with `RepoError::Unavailable` when unreachable.
    async fn ping(&self) -> RepoResult<()>;

    // --- Users ---
    async fn count_users(&self) -> RepoResult<u64>;
    async fn get_user(&self, id: &str) -> RepoResult<Option<User>>;
    async fn get_user_credentials(&self, id: &str) -> RepoResult<Option<StoredUser>>;
    /// Lookup for login; `email` is matched lower-cased.
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<StoredUser>>;
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn insert_user(&self, user: &StoredUser) -> RepoResult<()>;
    /// Inserts the bootstrap account. Fails with `RepoError::Duplicate` on
    /// `first_user` when an account already exists or a concurrent call won.
    async fn insert_first_user(&self, user: &StoredUser) -> RepoResult<()>;
    async fn update_user_password(&self, id: &str, salt: &str, hash: &str) -> RepoResult<bool>;
    async fn delete_user(&self, id: &str) -> RepoResult<bool>;

    // --- Programmes (unique: code_formation) ---
    async fn list_programmes(
        &self,
        filter: &ProgrammeFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Programme>>;
    async fn get_programme(&self, id: &str) -> RepoResult<Option<Programme>>;
    async fn insert_programme(&self, programme: &Programme) -> RepoResult<()>;
    async fn replace_programme(&self, programme: &Programme) -> RepoResult<bool>;
    async fn delete_programme(&self, id: &str) -> RepoResult<bool>;

    // --- Formations personnalisées ---
    async fn list_formations(
        &self,
        filter: &FormationFilter,
        page: PageRequest,
    ) -> RepoResult<Page<FormationPersonnalisee>>;
    async fn get_formation(&self, id: &str) -> RepoResult<Option<FormationPersonnalisee>>;
    async fn insert_formation(&self, formation: &FormationPersonnalisee) -> RepoResult<()>;
    async fn replace_formation(&self, formation: &FormationPersonnalisee) -> RepoResult<bool>;
    async fn delete_formation(&self, id: &str) -> RepoResult<bool>;

    // --- Apprenants (unique: email) ---
    async fn list_apprenants(
        &self,
        filter: &ApprenantFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Apprenant>>;
    async fn get_apprenant(&self, id: &str) -> RepoResult<Option<Apprenant>>;
    async fn insert_apprenant(&self, apprenant: &Apprenant) -> RepoResult<()>;
    async fn replace_apprenant(&self, apprenant: &Apprenant) -> RepoResult<bool>;
    async fn delete_apprenant(&self, id: &str) -> RepoResult<bool>;

    // --- Rendez-vous ---
    async fn list_rendez_vous(
        &self,
        filter: &RendezVousFilter,
        page: PageRequest,
    ) -> RepoResult<Page<RendezVous>>;
    async fn get_rendez_vous(&self, id: &str) -> RepoResult<Option<RendezVous>>;
    async fn insert_rendez_vous(&self, rdv: &RendezVous) -> RepoResult<()>;
    async fn replace_rendez_vous(&self, rdv: &RendezVous) -> RepoResult<bool>;
    async fn delete_rendez_vous(&self, id: &str) -> RepoResult<bool>;
    /// Start times ("HH:MM") held on `date` by booked, non-cancelled appointments,
    /// optionally ignoring the appointment `excluding` (when rescheduling it).
    async fn booked_slots(&self, date: NaiveDate, excluding: Option<&str>) -> RepoResult<Vec<String>>;

    // --- Articles (unique: slug) ---
    async fn list_articles(
        &self,
        filter: &ArticleFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Article>>;
    async fn get_article(&self, id: &str) -> RepoResult<Option<Article>>;
    async fn find_article_by_slug(&self, slug: &str) -> RepoResult<Option<Article>>;
    async fn insert_article(&self, article: &Article) -> RepoResult<()>;
    async fn replace_article(&self, article: &Article) -> RepoResult<bool>;
    async fn delete_article(&self, id: &str) -> RepoResult<bool>;

    // --- Media ---
    async fn list_media(&self, filter: &MediaFilter, page: PageRequest) -> RepoResult<Page<Media>>;
    async fn get_media(&self, id: &str) -> RepoResult<Option<Media>>;
    async fn insert_media(&self, media: &Media) -> RepoResult<()>;
    async fn delete_media(&self, id: &str) -> RepoResult<bool>;

    // --- Dashboard ---
    async fn stats(&self, today: NaiveDate) -> RepoResult<DashboardStats>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer held in the application state.
pub type RepositoryState = Arc<dyn Repository>;
