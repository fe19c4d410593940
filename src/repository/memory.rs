use async_trait::async_trait;
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{FIRST_USER, Repository};
use crate::error::{RepoError, RepoResult};
use crate::models::{
    Apprenant, ApprenantFilter, Article, ArticleFilter, DashboardStats, FormationFilter,
    FormationPersonnalisee, Media, MediaFilter, Page, PageRequest, Programme,
    ProgrammeFilter, RendezVous, RendezVousFilter, StatutApprenant, StatutFormation,
    StatutRendezVous, StoredUser, User,
};

/// Anything stored by id.
trait Record: Clone {
    fn record_id(&self) -> &str;
}

macro_rules! impl_record {
    ($($ty:ty => |$r:ident| $id:expr),+ $(,)?) => {
        $(impl Record for $ty {
            fn record_id(&self) -> &str {
                let $r = self;
                $id
            }
        })+
    };
}

impl_record! {
    StoredUser => |r| &r.user.id,
    Programme => |r| &r.id,
    FormationPersonnalisee => |r| &r.id,
    Apprenant => |r| &r.id,
    RendezVous => |r| &r.id,
    Article => |r| &r.id,
    Media => |r| &r.id,
}

#[derive(Default)]
struct Store {
    users: Vec<StoredUser>,
    programmes: Vec<Programme>,
    formations: Vec<FormationPersonnalisee>,
    apprenants: Vec<Apprenant>,
    rendez_vous: Vec<RendezVous>,
    articles: Vec<Article>,
    media: Vec<Media>,
}

/// InMemoryRepository
///
/// `Repository` over plain vectors. Used when no `MONGODB_URI` is configured in
/// local mode, and as the test double. Filtering, sorting and uniqueness follow
/// the MongoDB implementation.
///
/// `set_available(false)` makes every call fail with `RepoError::Unavailable`,
/// simulating an unreachable database.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
    unavailable: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_unavailable() -> Self {
        let repo = Self::default();
        repo.set_available(false);
        repo
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable(
                "in-memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

// --- Helpers over the record vectors ---

fn find_by_id<T: Record>(items: &[T], id: &str) -> Option<T> {
    items.iter().find(|item| item.record_id() == id).cloned()
}

fn insert_record<T: Record>(items: &mut Vec<T>, record: &T) -> RepoResult<()> {
    if items.iter().any(|item| item.record_id() == record.record_id()) {
        return Err(RepoError::Duplicate {
            field: "id".to_string(),
        });
    }
    items.push(record.clone());
    Ok(())
}

fn replace_record<T: Record>(items: &mut [T], record: &T) -> bool {
    match items
        .iter_mut()
        .find(|item| item.record_id() == record.record_id())
    {
        Some(slot) => {
            *slot = record.clone();
            true
        }
        None => false,
    }
}

fn remove_record<T: Record>(items: &mut Vec<T>, id: &str) -> bool {
    let before = items.len();
    items.retain(|item| item.record_id() != id);
    items.len() != before
}

/// Fails when another record (different id) already holds `key(record)`.
fn ensure_unique<T: Record>(
    items: &[T],
    record: &T,
    field: &str,
    key: impl Fn(&T) -> &str,
) -> RepoResult<()> {
    let value = key(record);
    let taken = items
        .iter()
        .any(|item| item.record_id() != record.record_id() && key(item) == value);
    if taken {
        return Err(RepoError::Duplicate {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Same rule as the partial unique index on `slot_key` in MongoDB.
fn ensure_slot_free(items: &[RendezVous], rdv: &RendezVous) -> RepoResult<()> {
    let Some(key) = rdv.slot_key() else {
        return Ok(());
    };
    let taken = items
        .iter()
        .any(|other| other.id != rdv.id && other.slot_key().as_deref() == Some(key.as_str()));
    if taken {
        return Err(RepoError::Duplicate {
            field: "slot_key".to_string(),
        });
    }
    Ok(())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn page_of<T: Clone>(
    mut items: Vec<T>,
    sort: impl FnMut(&T, &T) -> std::cmp::Ordering,
    page: PageRequest,
) -> Page<T> {
    items.sort_by(sort);
    Page::from_sorted(&items, page)
}

// --- Filters ---

fn matches_programme(p: &Programme, filter: &ProgrammeFilter) -> bool {
    if let Some(search) = non_empty(&filter.search) {
        if !(contains_ci(&p.titre, search)
            || contains_ci(&p.code_formation, search)
            || contains_ci(&p.description, search))
        {
            return false;
        }
    }
    if let Some(categorie) = non_empty(&filter.categorie) {
        if p.categorie.as_deref() != Some(categorie) {
            return false;
        }
    }
    if filter.modalite.is_some_and(|m| m != p.modalite) {
        return false;
    }
    if filter.publie.is_some_and(|publie| publie != p.est_publie) {
        return false;
    }
    true
}

fn matches_formation(f: &FormationPersonnalisee, filter: &FormationFilter) -> bool {
    if non_empty(&filter.apprenant).is_some_and(|a| a != f.apprenant) {
        return false;
    }
    if non_empty(&filter.programme).is_some_and(|p| f.programme.as_deref() != Some(p)) {
        return false;
    }
    if filter.statut.is_some_and(|s| s != f.statut) {
        return false;
    }
    true
}

fn matches_apprenant(a: &Apprenant, filter: &ApprenantFilter) -> bool {
    if let Some(search) = non_empty(&filter.search) {
        if !(contains_ci(&a.nom, search) || contains_ci(&a.prenom, search) || contains_ci(&a.email, search)) {
            return false;
        }
    }
    if filter.statut.is_some_and(|s| s != a.statut) {
        return false;
    }
    if non_empty(&filter.programme).is_some_and(|p| !a.programmes.iter().any(|id| id == p)) {
        return false;
    }
    true
}

fn matches_rendez_vous(r: &RendezVous, filter: &RendezVousFilter) -> bool {
    if filter.statut.is_some_and(|s| s != r.statut) {
        return false;
    }
    if filter.type_rdv.is_some_and(|t| t != r.type_rdv) {
        return false;
    }
    if let Some(date) = filter.date {
        if r.date != date {
            return false;
        }
    } else if filter.date_from.is_some_and(|from| r.date < from) {
        return false;
    }
    if non_empty(&filter.programme).is_some_and(|p| r.programme.as_deref() != Some(p)) {
        return false;
    }
    true
}

fn matches_article(a: &Article, filter: &ArticleFilter) -> bool {
    if let Some(search) = non_empty(&filter.search) {
        let in_extrait = a.extrait.as_deref().is_some_and(|e| contains_ci(e, search));
        if !(contains_ci(&a.titre, search) || in_extrait) {
            return false;
        }
    }
    if let Some(categorie) = non_empty(&filter.categorie) {
        if a.categorie.as_deref() != Some(categorie) {
            return false;
        }
    }
    if let Some(tag) = non_empty(&filter.tag) {
        let tag = tag.to_lowercase();
        if !a.tags.contains(&tag) {
            return false;
        }
    }
    if filter.statut.is_some_and(|s| s != a.statut) {
        return false;
    }
    true
}

fn matches_media(m: &Media, filter: &MediaFilter) -> bool {
    non_empty(&filter.mime_type).is_none_or(|prefix| m.mime_type.starts_with(prefix))
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn ping(&self) -> RepoResult<()> {
        self.check()
    }

    // --- Users ---

    async fn count_users(&self) -> RepoResult<u64> {
        self.check()?;
        Ok(self.store.read().await.users.len() as u64)
    }

    async fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        self.check()?;
        Ok(find_by_id(&self.store.read().await.users, id).map(|s| s.user))
    }

    async fn get_user_credentials(&self, id: &str) -> RepoResult<Option<StoredUser>> {
        self.check()?;
        Ok(find_by_id(&self.store.read().await.users, id))
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<StoredUser>> {
        self.check()?;
        let email = email.trim().to_lowercase();
        let store = self.store.read().await;
        Ok(store.users.iter().find(|s| s.user.email == email).cloned())
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        self.check()?;
        let store = self.store.read().await;
        let mut users: Vec<User> = store.users.iter().map(|s| s.user.clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn insert_user(&self, user: &StoredUser) -> RepoResult<()> {
        self.check()?;
        let mut store = self.store.write().await;
        ensure_unique(&store.users, user, "email", |s| s.user.email.as_str())?;
        insert_record(&mut store.users, user)
    }

    async fn insert_first_user(&self, user: &StoredUser) -> RepoResult<()> {
        self.check()?;
        let mut store = self.store.write().await;
        if !store.users.is_empty() {
            return Err(RepoError::Duplicate {
                field: FIRST_USER.to_string(),
            });
        }
        insert_record(&mut store.users, user)
    }

    async fn update_user_password(&self, id: &str, salt: &str, hash: &str) -> RepoResult<bool> {
        self.check()?;
        let mut store = self.store.write().await;
        match store.users.iter_mut().find(|s| s.user.id == id) {
            Some(stored) => {
                stored.salt = salt.to_string();
                stored.hash = hash.to_string();
                stored.user.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: &str) -> RepoResult<bool> {
        self.check()?;
        Ok(remove_record(&mut self.store.write().await.users, id))
    }

    // --- Programmes ---

    async fn list_programmes(
        &self,
        filter: &ProgrammeFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Programme>> {
        self.check()?;
        let store = self.store.read().await;
        let matching = store
            .programmes
            .iter()
            .filter(|p| matches_programme(p, filter))
            .cloned()
            .collect();
        Ok(page_of(
            matching,
            |a, b| a.titre.cmp(&b.titre).then_with(|| a.id.cmp(&b.id)),
            page,
        ))
    }

    async fn get_programme(&self, id: &str) -> RepoResult<Option<Programme>> {
        self.check()?;
        Ok(find_by_id(&self.store.read().await.programmes, id))
    }

    async fn insert_programme(&self, programme: &Programme) -> RepoResult<()> {
        self.check()?;
        let mut store = self.store.write().await;
        ensure_unique(&store.programmes, programme, "code_formation", |p| p.code_formation.as_str())?;
        insert_record(&mut store.programmes, programme)
    }

    async fn replace_programme(&self, programme: &Programme) -> RepoResult<bool> {
        self.check()?;
        let mut store = self.store.write().await;
        ensure_unique(&store.programmes, programme, "code_formation", |p| p.code_formation.as_str())?;
        Ok(replace_record(&mut store.programmes, programme))
    }

    async fn delete_programme(&self, id: &str) -> RepoResult<bool> {
        self.check()?;
        Ok(remove_record(&mut self.store.write().await.programmes, id))
    }

    // --- Formations personnalisées ---

    async fn list_formations(
        &self,
        filter: &FormationFilter,
        page: PageRequest,
    ) -> RepoResult<Page<FormationPersonnalisee>> {
        self.check()?;
        let store = self.store.read().await;
        let matching = store
            .formations
            .iter()
            .filter(|f| matches_formation(f, filter))
            .cloned()
            .collect();
        Ok(page_of(
            matching,
            |a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            },
            page,
        ))
    }

    async fn get_formation(&self, id: &str) -> RepoResult<Option<FormationPersonnalisee>> {
        self.check()?;
        Ok(find_by_id(&self.store.read().await.formations, id))
    }

    async fn insert_formation(&self, formation: &FormationPersonnalisee) -> RepoResult<()> {
        self.check()?;
        insert_record(&mut self.store.write().await.formations, formation)
    }

    async fn replace_formation(&self, formation: &FormationPersonnalisee) -> RepoResult<bool> {
        self.check()?;
        Ok(replace_record(&mut self.store.write().await.formations, formation))
    }

    async fn delete_formation(&self, id: &str) -> RepoResult<bool> {
        self.check()?;
        Ok(remove_record(&mut self.store.write().await.formations, id))
    }

    // --- Apprenants ---

    async fn list_apprenants(
        &self,
        filter: &ApprenantFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Apprenant>> {
        self.check()?;
        let store = self.store.read().await;
        let matching = store
            .apprenants
            .iter()
            .filter(|a| matches_apprenant(a, filter))
            .cloned()
            .collect();
        Ok(page_of(
            matching,
            |a, b| {
                a.nom
                    .cmp(&b.nom)
                    .then_with(|| a.prenom.cmp(&b.prenom))
                    .then_with(|| a.id.cmp(&b.id))
            },
            page,
        ))
    }

    async fn get_apprenant(&self, id: &str) -> RepoResult<Option<Apprenant>> {
        self.check()?;
        Ok(find_by_id(&self.store.read().await.apprenants, id))
    }

    async fn insert_apprenant(&self, apprenant: &Apprenant) -> RepoResult<()> {
        self.check()?;
        let mut store = self.store.write().await;
        ensure_unique(&store.apprenants, apprenant, "email", |a| a.email.as_str())?;
        insert_record(&mut store.apprenants, apprenant)
    }

    async fn replace_apprenant(&self, apprenant: &Apprenant) -> RepoResult<bool> {
        self.check()?;
        let mut store = self.store.write().await;
        ensure_unique(&store.apprenants, apprenant, "email", |a| a.email.as_str())?;
        Ok(replace_record(&mut store.apprenants, apprenant))
    }

    async fn delete_apprenant(&self, id: &str) -> RepoResult<bool> {
        self.check()?;
        Ok(remove_record(&mut self.store.write().await.apprenants, id))
    }

    // --- Rendez-vous ---

    async fn list_rendez_vous(
        &self,
        filter: &RendezVousFilter,
        page: PageRequest,
    ) -> RepoResult<Page<RendezVous>> {
        self.check()?;
        let store = self.store.read().await;
        let matching = store
            .rendez_vous
            .iter()
            .filter(|r| matches_rendez_vous(r, filter))
            .cloned()
            .collect();
        Ok(page_of(
            matching,
            |a, b| {
                a.date
                    .cmp(&b.date)
                    .then_with(|| a.heure.cmp(&b.heure))
                    .then_with(|| a.id.cmp(&b.id))
            },
            page,
        ))
    }

    async fn get_rendez_vous(&self, id: &str) -> RepoResult<Option<RendezVous>> {
        self.check()?;
        Ok(find_by_id(&self.store.read().await.rendez_vous, id))
    }

    async fn insert_rendez_vous(&self, rdv: &RendezVous) -> RepoResult<()> {
        self.check()?;
        let mut store = self.store.write().await;
        ensure_slot_free(&store.rendez_vous, rdv)?;
        insert_record(&mut store.rendez_vous, rdv)
    }

    async fn replace_rendez_vous(&self, rdv: &RendezVous) -> RepoResult<bool> {
        self.check()?;
        let mut store = self.store.write().await;
        ensure_slot_free(&store.rendez_vous, rdv)?;
        Ok(replace_record(&mut store.rendez_vous, rdv))
    }

    async fn delete_rendez_vous(&self, id: &str) -> RepoResult<bool> {
        self.check()?;
        Ok(remove_record(&mut self.store.write().await.rendez_vous, id))
    }

    async fn booked_slots(&self, date: NaiveDate, excluding: Option<&str>) -> RepoResult<Vec<String>> {
        self.check()?;
        let store = self.store.read().await;
        let mut slots: Vec<String> = store
            .rendez_vous
            .iter()
            .filter(|r| r.date == date && r.holds_slot())
            .filter(|r| excluding != Some(r.id.as_str()))
            .map(|r| r.heure.clone())
            .collect();
        slots.sort();
        Ok(slots)
    }

    // --- Articles ---

    async fn list_articles(
        &self,
        filter: &ArticleFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Article>> {
        self.check()?;
        let store = self.store.read().await;
        let matching = store
            .articles
            .iter()
            .filter(|a| matches_article(a, filter))
            .cloned()
            .collect();
        Ok(page_of(
            matching,
            |a, b| {
                Reverse(a.date_publication)
                    .cmp(&Reverse(b.date_publication))
                    .then_with(|| b.created_at.cmp(&a.created_at))
                    .then_with(|| b.id.cmp(&a.id))
            },
            page,
        ))
    }

    async fn get_article(&self, id: &str) -> RepoResult<Option<Article>> {
        self.check()?;
        Ok(find_by_id(&self.store.read().await.articles, id))
    }

    async fn find_article_by_slug(&self, slug: &str) -> RepoResult<Option<Article>> {
        self.check()?;
        let store = self.store.read().await;
        Ok(store.articles.iter().find(|a| a.slug == slug).cloned())
    }

    async fn insert_article(&self, article: &Article) -> RepoResult<()> {
        self.check()?;
        let mut store = self.store.write().await;
        ensure_unique(&store.articles, article, "slug", |a| a.slug.as_str())?;
        insert_record(&mut store.articles, article)
    }

    async fn replace_article(&self, article: &Article) -> RepoResult<bool> {
        self.check()?;
        let mut store = self.store.write().await;
        ensure_unique(&store.articles, article, "slug", |a| a.slug.as_str())?;
        Ok(replace_record(&mut store.articles, article))
    }

    async fn delete_article(&self, id: &str) -> RepoResult<bool> {
        self.check()?;
        Ok(remove_record(&mut self.store.write().await.articles, id))
    }

    // --- Media ---

    async fn list_media(&self, filter: &MediaFilter, page: PageRequest) -> RepoResult<Page<Media>> {
        self.check()?;
        let store = self.store.read().await;
        let matching = store
            .media
            .iter()
            .filter(|m| matches_media(m, filter))
            .cloned()
            .collect();
        Ok(page_of(
            matching,
            |a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            },
            page,
        ))
    }

    async fn get_media(&self, id: &str) -> RepoResult<Option<Media>> {
        self.check()?;
        Ok(find_by_id(&self.store.read().await.media, id))
    }

    async fn insert_media(&self, media: &Media) -> RepoResult<()> {
        self.check()?;
        let mut store = self.store.write().await;
        ensure_unique(&store.media, media, "storage_key", |m| m.storage_key.as_str())?;
        insert_record(&mut store.media, media)
    }

    async fn delete_media(&self, id: &str) -> RepoResult<bool> {
        self.check()?;
        Ok(remove_record(&mut self.store.write().await.media, id))
    }

    // --- Dashboard ---

    async fn stats(&self, today: NaiveDate) -> RepoResult<DashboardStats> {
        self.check()?;
        let store = self.store.read().await;
        let count = |n: usize| n as u64;
        Ok(DashboardStats {
            total_programmes: count(store.programmes.len()),
            programmes_publies: count(store.programmes.iter().filter(|p| p.est_publie).count()),
            total_apprenants: count(store.apprenants.len()),
            apprenants_en_formation: count(
                store
                    .apprenants
                    .iter()
                    .filter(|a| a.statut == StatutApprenant::EnFormation)
                    .count(),
            ),
            formations_en_cours: count(
                store
                    .formations
                    .iter()
                    .filter(|f| f.statut == StatutFormation::EnCours)
                    .count(),
            ),
            rendez_vous_en_attente: count(
                store
                    .rendez_vous
                    .iter()
                    .filter(|r| r.statut == StatutRendezVous::EnAttente)
                    .count(),
            ),
            rendez_vous_a_venir: count(
                store
                    .rendez_vous
                    .iter()
                    .filter(|r| r.date >= today && r.statut != StatutRendezVous::Annule)
                    .count(),
            ),
            articles_publies: count(store.articles.iter().filter(|a| a.is_published()).count()),
            total_media: count(store.media.len()),
        })
    }
}
