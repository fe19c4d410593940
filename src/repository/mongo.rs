use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{self, Bson, Document, doc, oid::ObjectId},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions},
};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

use super::{FIRST_USER, Repository, collections};
use crate::error::{RepoError, RepoResult};
use crate::models::{
    Apprenant, ApprenantFilter, Article, ArticleFilter, DashboardStats, FormationFilter,
    FormationPersonnalisee, Media, MediaFilter, Page, PageRequest, Programme, ProgrammeFilter,
    RendezVous, RendezVousFilter, StatutApprenant, StatutArticle, StatutFormation,
    StatutRendezVous, StoredUser, User,
};

const DUPLICATE_KEY: i32 = 11000;

/// Stored-only field of held appointments, see `RendezVous::slot_key`.
const SLOT_KEY: &str = "slot_key";

const SPARSE_UNIQUE_FIELDS: [(&str, &str); 2] = [
    (collections::RENDEZ_VOUS, SLOT_KEY),
    (collections::USERS, FIRST_USER),
];

/// Unique indexes created at startup: (collection, field).
const UNIQUE_FIELDS: [(&str, &str); 5] = [
    (collections::USERS, "email"),
    (collections::PROGRAMMES, "code_formation"),
    (collections::APPRENANTS, "email"),
    (collections::ARTICLES, "slug"),
    (collections::MEDIA, "storage_key"),
];

/// MongoRepository
///
/// `Repository` backed by the MongoDB driver. Records are stored as plain
/// documents whose `_id` is the ObjectId behind the record's `id` string.
#[derive(Clone)]
pub struct MongoRepository {
    db: Database,
}

impl MongoRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Builds a client for `uri`. The database named in the URI wins over `default_db`.
    ///
    /// The driver connects lazily, so an unreachable server only surfaces on the
    /// first operation (after `timeout`).
    pub async fn connect(uri: &str, default_db: &str, timeout: Duration) -> RepoResult<Self> {
        let mut options = ClientOptions::parse(uri).await.map_err(map_error)?;
        options.app_name = Some("formation-backoffice".to_string());
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);

        let client = Client::with_options(options).map_err(map_error)?;
        let db = client
            .default_database()
            .unwrap_or_else(|| client.database(default_db));
        Ok(Self::new(db))
    }

    /// Creates the unique indexes backing the duplicate-key checks. Idempotent.
    pub async fn ensure_indexes(&self) -> RepoResult<()> {
        for (collection, field) in UNIQUE_FIELDS {
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection(collection)
                .create_index(index)
                .await
                .map_err(map_error)?;
            tracing::debug!(collection, field, "unique index ensured");
        }

        // Stored-only markers, present on a subset of the documents.
        for (collection, field) in SPARSE_UNIQUE_FIELDS {
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { field: { "$exists": true } })
                        .build(),
                )
                .build();
            self.collection(collection)
                .create_index(index)
                .await
                .map_err(map_error)?;
            tracing::debug!(collection, field, "partial unique index ensured");
        }
        Ok(())
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }

    async fn insert<T: Serialize + Sync>(&self, collection: &str, record: &T) -> RepoResult<()> {
        self.insert_document(collection, to_document(record)?).await
    }

    async fn insert_document(&self, collection: &str, document: Document) -> RepoResult<()> {
        self.collection(collection)
            .insert_one(document)
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn find_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Document,
    ) -> RepoResult<Option<T>> {
        let found = self
            .collection(collection)
            .find_one(filter)
            .await
            .map_err(map_error)?;
        found.map(from_document).transpose()
    }

    async fn find_by_id<T: DeserializeOwned>(&self, collection: &str, id: &str) -> RepoResult<Option<T>> {
        match parse_id(id) {
            Some(oid) => self.find_one(collection, doc! { "_id": oid }).await,
            None => Ok(None),
        }
    }

    async fn find_all<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Document,
        sort: Document,
    ) -> RepoResult<Vec<T>> {
        let cursor = self
            .collection(collection)
            .find(filter)
            .sort(sort)
            .await
            .map_err(map_error)?;
        let documents: Vec<Document> = cursor.try_collect().await.map_err(map_error)?;
        documents.into_iter().map(from_document).collect()
    }

    async fn find_page<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Document,
        sort: Document,
        page: PageRequest,
    ) -> RepoResult<Page<T>> {
        let total = self.count(collection, filter.clone()).await?;
        let cursor = self
            .collection(collection)
            .find(filter)
            .sort(sort)
            // The driver sends skip as an i64.
            .skip(page.skip().min(i64::MAX as u64))
            .limit(i64::try_from(page.limit).unwrap_or(i64::MAX))
            .await
            .map_err(map_error)?;
        let documents: Vec<Document> = cursor.try_collect().await.map_err(map_error)?;
        let items = documents
            .into_iter()
            .map(from_document)
            .collect::<RepoResult<Vec<T>>>()?;
        Ok(Page { items, total })
    }

    async fn replace<T: Serialize + Sync>(&self, collection: &str, id: &str, record: &T) -> RepoResult<bool> {
        self.replace_document(collection, id, to_document(record)?).await
    }

    async fn replace_document(&self, collection: &str, id: &str, document: Document) -> RepoResult<bool> {
        let Some(oid) = parse_id(id) else {
            return Ok(false);
        };
        let result = self
            .collection(collection)
            .replace_one(doc! { "_id": oid }, document)
            .await
            .map_err(map_error)?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> RepoResult<bool> {
        let Some(oid) = parse_id(id) else {
            return Ok(false);
        };
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(map_error)?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self, collection: &str, filter: Document) -> RepoResult<u64> {
        self.collection(collection)
            .count_documents(filter)
            .await
            .map_err(map_error)
    }

    /// Rejects `value` for `field` when another record already holds it. The
    /// unique index remains the final arbiter under concurrent writes.
    async fn ensure_unique(&self, collection: &str, field: &str, value: &str, id: &str) -> RepoResult<()> {
        let mut filter = doc! { field: value };
        if let Some(oid) = parse_id(id) {
            filter.insert("_id", doc! { "$ne": oid });
        }
        let taken = self
            .collection(collection)
            .find_one(filter)
            .await
            .map_err(map_error)?
            .is_some();
        if taken {
            return Err(RepoError::Duplicate {
                field: field.to_string(),
            });
        }
        Ok(())
    }
}

// --- Document mapping ---

fn parse_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// Serializes a record, moving its `id` string into an ObjectId `_id`.
fn to_document<T: Serialize>(record: &T) -> RepoResult<Document> {
    let mut document =
        bson::to_document(record).map_err(|e| RepoError::Serialization(e.to_string()))?;
    if let Some(Bson::String(id)) = document.remove("id") {
        let oid = ObjectId::parse_str(&id)
            .map_err(|e| RepoError::Serialization(format!("invalid record id `{id}`: {e}")))?;
        document.insert("_id", oid);
    }
    Ok(document)
}

/// Deserializes a stored document, exposing `_id` as the record's `id` string.
fn from_document<T: DeserializeOwned>(mut document: Document) -> RepoResult<T> {
    if let Some(raw_id) = document.remove("_id") {
        let id = match raw_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(id) => id,
            other => other.to_string(),
        };
        document.insert("id", id);
    }
    bson::from_document(document).map_err(|e| RepoError::Serialization(e.to_string()))
}

fn rendez_vous_document(rdv: &RendezVous) -> RepoResult<Document> {
    let mut document = to_document(rdv)?;
    if let Some(key) = rdv.slot_key() {
        document.insert(SLOT_KEY, key);
    }
    Ok(document)
}

fn enum_value<T: Serialize>(value: &T) -> RepoResult<Bson> {
    bson::to_bson(value).map_err(|e| RepoError::Serialization(e.to_string()))
}

/// Case-insensitive substring match on literal user input.
fn contains_ci(needle: &str) -> Document {
    doc! { "$regex": regex::escape(needle.trim()), "$options": "i" }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn map_error(err: MongoError) -> RepoError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
            RepoError::Duplicate {
                field: duplicate_field(&write.message),
            }
        }
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. } => RepoError::Unavailable(err.to_string()),
        ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
            RepoError::Serialization(err.to_string())
        }
        _ => RepoError::Database(err.to_string()),
    }
}

/// Extracts the field from "... index: code_formation_1 dup key: ...".
fn duplicate_field(message: &str) -> String {
    message
        .split("index: ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .map(|index| index.trim_end_matches("_1").to_string())
        .unwrap_or_else(|| "key".to_string())
}

// --- Filters ---

fn programme_filter(filter: &ProgrammeFilter) -> RepoResult<Document> {
    let mut query = doc! {};
    if let Some(search) = non_empty(&filter.search) {
        let pattern = contains_ci(search);
        query.insert(
            "$or",
            vec![
                doc! { "titre": pattern.clone() },
                doc! { "code_formation": pattern.clone() },
                doc! { "description": pattern },
            ],
        );
    }
    if let Some(categorie) = non_empty(&filter.categorie) {
        query.insert("categorie", categorie);
    }
    if let Some(modalite) = &filter.modalite {
        query.insert("modalite", enum_value(modalite)?);
    }
    if let Some(publie) = filter.publie {
        query.insert("est_publie", publie);
    }
    Ok(query)
}

fn formation_filter(filter: &FormationFilter) -> RepoResult<Document> {
    let mut query = doc! {};
    if let Some(apprenant) = non_empty(&filter.apprenant) {
        query.insert("apprenant", apprenant);
    }
    if let Some(programme) = non_empty(&filter.programme) {
        query.insert("programme", programme);
    }
    if let Some(statut) = &filter.statut {
        query.insert("statut", enum_value(statut)?);
    }
    Ok(query)
}

fn apprenant_filter(filter: &ApprenantFilter) -> RepoResult<Document> {
    let mut query = doc! {};
    if let Some(search) = non_empty(&filter.search) {
        let pattern = contains_ci(search);
        query.insert(
            "$or",
            vec![
                doc! { "nom": pattern.clone() },
                doc! { "prenom": pattern.clone() },
                doc! { "email": pattern },
            ],
        );
    }
    if let Some(statut) = &filter.statut {
        query.insert("statut", enum_value(statut)?);
    }
    if let Some(programme) = non_empty(&filter.programme) {
        query.insert("programmes", programme);
    }
    Ok(query)
}

fn rendez_vous_filter(filter: &RendezVousFilter) -> RepoResult<Document> {
    let mut query = doc! {};
    if let Some(statut) = &filter.statut {
        query.insert("statut", enum_value(statut)?);
    }
    if let Some(type_rdv) = &filter.type_rdv {
        query.insert("type_rdv", enum_value(type_rdv)?);
    }
    if let Some(date) = filter.date {
        query.insert("date", date.to_string());
    } else if let Some(from) = filter.date_from {
        query.insert("date", doc! { "$gte": from.to_string() });
    }
    if let Some(programme) = non_empty(&filter.programme) {
        query.insert("programme", programme);
    }
    Ok(query)
}

fn article_filter(filter: &ArticleFilter) -> RepoResult<Document> {
    let mut query = doc! {};
    if let Some(search) = non_empty(&filter.search) {
        let pattern = contains_ci(search);
        query.insert(
            "$or",
            vec![doc! { "titre": pattern.clone() }, doc! { "extrait": pattern }],
        );
    }
    if let Some(categorie) = non_empty(&filter.categorie) {
        query.insert("categorie", categorie);
    }
    if let Some(tag) = non_empty(&filter.tag) {
        query.insert("tags", tag.to_lowercase());
    }
    if let Some(statut) = &filter.statut {
        query.insert("statut", enum_value(statut)?);
    }
    Ok(query)
}

fn media_filter(filter: &MediaFilter) -> Document {
    let mut query = doc! {};
    if let Some(prefix) = non_empty(&filter.mime_type) {
        query.insert("mime_type", doc! { "$regex": format!("^{}", regex::escape(prefix)) });
    }
    query
}

#[async_trait]
impl Repository for MongoRepository {
    async fn ping(&self) -> RepoResult<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(map_error)?;
        Ok(())
    }

    // --- Users ---

    async fn count_users(&self) -> RepoResult<u64> {
        self.count(collections::USERS, doc! {}).await
    }

    async fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        let stored: Option<StoredUser> = self.find_by_id(collections::USERS, id).await?;
        Ok(stored.map(|s| s.user))
    }

    async fn get_user_credentials(&self, id: &str) -> RepoResult<Option<StoredUser>> {
        self.find_by_id(collections::USERS, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<StoredUser>> {
        let email = email.trim().to_lowercase();
        self.find_one(collections::USERS, doc! { "email": email }).await
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let stored: Vec<StoredUser> = self
            .find_all(collections::USERS, doc! {}, doc! { "created_at": 1, "_id": 1 })
            .await?;
        Ok(stored.into_iter().map(|s| s.user).collect())
    }

    async fn insert_user(&self, user: &StoredUser) -> RepoResult<()> {
        self.ensure_unique(collections::USERS, "email", &user.user.email, &user.user.id)
            .await?;
        self.insert(collections::USERS, user).await
    }

    async fn insert_first_user(&self, user: &StoredUser) -> RepoResult<()> {
        if self.count(collections::USERS, doc! {}).await? > 0 {
            return Err(RepoError::Duplicate {
                field: FIRST_USER.to_string(),
            });
        }
        // The partial unique index on the marker settles concurrent bootstraps.
        let mut document = to_document(user)?;
        document.insert(FIRST_USER, true);
        self.insert_document(collections::USERS, document).await
    }

    async fn update_user_password(&self, id: &str, salt: &str, hash: &str) -> RepoResult<bool> {
        let Some(oid) = parse_id(id) else {
            return Ok(false);
        };
        let now = chrono::Utc::now();
        let result = self
            .collection(collections::USERS)
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "salt": salt, "hash": hash, "updated_at": enum_value(&now)? } },
            )
            .await
            .map_err(map_error)?;
        Ok(result.matched_count > 0)
    }

    async fn delete_user(&self, id: &str) -> RepoResult<bool> {
        self.delete_by_id(collections::USERS, id).await
    }

    // --- Programmes ---

    async fn list_programmes(
        &self,
        filter: &ProgrammeFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Programme>> {
        self.find_page(
            collections::PROGRAMMES,
            programme_filter(filter)?,
            doc! { "titre": 1, "_id": 1 },
            page,
        )
        .await
    }

    async fn get_programme(&self, id: &str) -> RepoResult<Option<Programme>> {
        self.find_by_id(collections::PROGRAMMES, id).await
    }

    async fn insert_programme(&self, programme: &Programme) -> RepoResult<()> {
        self.ensure_unique(
            collections::PROGRAMMES,
            "code_formation",
            &programme.code_formation,
            &programme.id,
        )
        .await?;
        self.insert(collections::PROGRAMMES, programme).await
    }

    async fn replace_programme(&self, programme: &Programme) -> RepoResult<bool> {
        self.ensure_unique(
            collections::PROGRAMMES,
            "code_formation",
            &programme.code_formation,
            &programme.id,
        )
        .await?;
        self.replace(collections::PROGRAMMES, &programme.id, programme).await
    }

    async fn delete_programme(&self, id: &str) -> RepoResult<bool> {
        self.delete_by_id(collections::PROGRAMMES, id).await
    }

    // --- Formations personnalisées ---

    async fn list_formations(
        &self,
        filter: &FormationFilter,
        page: PageRequest,
    ) -> RepoResult<Page<FormationPersonnalisee>> {
        self.find_page(
            collections::FORMATIONS,
            formation_filter(filter)?,
            doc! { "created_at": -1, "_id": -1 },
            page,
        )
        .await
    }

    async fn get_formation(&self, id: &str) -> RepoResult<Option<FormationPersonnalisee>> {
        self.find_by_id(collections::FORMATIONS, id).await
    }

    async fn insert_formation(&self, formation: &FormationPersonnalisee) -> RepoResult<()> {
        self.insert(collections::FORMATIONS, formation).await
    }

    async fn replace_formation(&self, formation: &FormationPersonnalisee) -> RepoResult<bool> {
        self.replace(collections::FORMATIONS, &formation.id, formation).await
    }

    async fn delete_formation(&self, id: &str) -> RepoResult<bool> {
        self.delete_by_id(collections::FORMATIONS, id).await
    }

    // --- Apprenants ---

    async fn list_apprenants(
        &self,
        filter: &ApprenantFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Apprenant>> {
        self.find_page(
            collections::APPRENANTS,
            apprenant_filter(filter)?,
            doc! { "nom": 1, "prenom": 1, "_id": 1 },
            page,
        )
        .await
    }

    async fn get_apprenant(&self, id: &str) -> RepoResult<Option<Apprenant>> {
        self.find_by_id(collections::APPRENANTS, id).await
    }

    async fn insert_apprenant(&self, apprenant: &Apprenant) -> RepoResult<()> {
        self.ensure_unique(collections::APPRENANTS, "email", &apprenant.email, &apprenant.id)
            .await?;
        self.insert(collections::APPRENANTS, apprenant).await
    }

    async fn replace_apprenant(&self, apprenant: &Apprenant) -> RepoResult<bool> {
        self.ensure_unique(collections::APPRENANTS, "email", &apprenant.email, &apprenant.id)
            .await?;
        self.replace(collections::APPRENANTS, &apprenant.id, apprenant).await
    }

    async fn delete_apprenant(&self, id: &str) -> RepoResult<bool> {
        self.delete_by_id(collections::APPRENANTS, id).await
    }

    // --- Rendez-vous ---

    async fn list_rendez_vous(
        &self,
        filter: &RendezVousFilter,
        page: PageRequest,
    ) -> RepoResult<Page<RendezVous>> {
        self.find_page(
            collections::RENDEZ_VOUS,
            rendez_vous_filter(filter)?,
            doc! { "date": 1, "heure": 1, "_id": 1 },
            page,
        )
        .await
    }

    async fn get_rendez_vous(&self, id: &str) -> RepoResult<Option<RendezVous>> {
        self.find_by_id(collections::RENDEZ_VOUS, id).await
    }

    async fn insert_rendez_vous(&self, rdv: &RendezVous) -> RepoResult<()> {
        self.insert_document(collections::RENDEZ_VOUS, rendez_vous_document(rdv)?)
            .await
    }

    async fn replace_rendez_vous(&self, rdv: &RendezVous) -> RepoResult<bool> {
        self.replace_document(collections::RENDEZ_VOUS, &rdv.id, rendez_vous_document(rdv)?)
            .await
    }

    async fn delete_rendez_vous(&self, id: &str) -> RepoResult<bool> {
        self.delete_by_id(collections::RENDEZ_VOUS, id).await
    }

    async fn booked_slots(&self, date: NaiveDate, excluding: Option<&str>) -> RepoResult<Vec<String>> {
        let mut filter = doc! {
            "date": date.to_string(),
            "origine": { "$ne": "contact" },
            "statut": { "$ne": enum_value(&StatutRendezVous::Annule)? },
        };
        if let Some(oid) = excluding.and_then(parse_id) {
            filter.insert("_id", doc! { "$ne": oid });
        }
        let booked: Vec<RendezVous> = self
            .find_all(collections::RENDEZ_VOUS, filter, doc! { "heure": 1 })
            .await?;
        Ok(booked.into_iter().map(|rdv| rdv.heure).collect())
    }

    // --- Articles ---

    async fn list_articles(
        &self,
        filter: &ArticleFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Article>> {
        self.find_page(
            collections::ARTICLES,
            article_filter(filter)?,
            doc! { "date_publication": -1, "created_at": -1, "_id": -1 },
            page,
        )
        .await
    }

    async fn get_article(&self, id: &str) -> RepoResult<Option<Article>> {
        self.find_by_id(collections::ARTICLES, id).await
    }

    async fn find_article_by_slug(&self, slug: &str) -> RepoResult<Option<Article>> {
        self.find_one(collections::ARTICLES, doc! { "slug": slug }).await
    }

    async fn insert_article(&self, article: &Article) -> RepoResult<()> {
        self.ensure_unique(collections::ARTICLES, "slug", &article.slug, &article.id)
            .await?;
        self.insert(collections::ARTICLES, article).await
    }

    async fn replace_article(&self, article: &Article) -> RepoResult<bool> {
        self.ensure_unique(collections::ARTICLES, "slug", &article.slug, &article.id)
            .await?;
        self.replace(collections::ARTICLES, &article.id, article).await
    }

    async fn delete_article(&self, id: &str) -> RepoResult<bool> {
        self.delete_by_id(collections::ARTICLES, id).await
    }

    // --- Media ---

    async fn list_media(&self, filter: &MediaFilter, page: PageRequest) -> RepoResult<Page<Media>> {
        self.find_page(
            collections::MEDIA,
            media_filter(filter),
            doc! { "created_at": -1, "_id": -1 },
            page,
        )
        .await
    }

    async fn get_media(&self, id: &str) -> RepoResult<Option<Media>> {
        self.find_by_id(collections::MEDIA, id).await
    }

    async fn insert_media(&self, media: &Media) -> RepoResult<()> {
        self.ensure_unique(collections::MEDIA, "storage_key", &media.storage_key, &media.id)
            .await?;
        self.insert(collections::MEDIA, media).await
    }

    async fn delete_media(&self, id: &str) -> RepoResult<bool> {
        self.delete_by_id(collections::MEDIA, id).await
    }

    // --- Dashboard ---

    async fn stats(&self, today: NaiveDate) -> RepoResult<DashboardStats> {
        Ok(DashboardStats {
            total_programmes: self.count(collections::PROGRAMMES, doc! {}).await?,
            programmes_publies: self
                .count(collections::PROGRAMMES, doc! { "est_publie": true })
                .await?,
            total_apprenants: self.count(collections::APPRENANTS, doc! {}).await?,
            apprenants_en_formation: self
                .count(
                    collections::APPRENANTS,
                    doc! { "statut": enum_value(&StatutApprenant::EnFormation)? },
                )
                .await?,
            formations_en_cours: self
                .count(
                    collections::FORMATIONS,
                    doc! { "statut": enum_value(&StatutFormation::EnCours)? },
                )
                .await?,
            rendez_vous_en_attente: self
                .count(
                    collections::RENDEZ_VOUS,
                    doc! { "statut": enum_value(&StatutRendezVous::EnAttente)? },
                )
                .await?,
            rendez_vous_a_venir: self
                .count(
                    collections::RENDEZ_VOUS,
                    doc! {
                        "date": { "$gte": today.to_string() },
                        "statut": { "$ne": enum_value(&StatutRendezVous::Annule)? },
                    },
                )
                .await?,
            articles_publies: self
                .count(
                    collections::ARTICLES,
                    doc! { "statut": enum_value(&StatutArticle::Publie)? },
                )
                .await?,
            total_media: self.count(collections::MEDIA, doc! {}).await?,
        })
    }
}
