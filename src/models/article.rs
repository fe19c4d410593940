use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use super::{clean, require, require_reference};
use crate::error::ApiError;

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StatutArticle {
    #[default]
    Brouillon,
    Publie,
}

/// Article
///
/// A blog post from the `articles` collection, addressed publicly by its unique `slug`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[ts(export)]
pub struct Article {
    pub id: String,
    pub titre: String,
    pub slug: String,
    #[serde(default)]
    pub extrait: Option<String>,
    #[serde(default)]
    pub contenu: String,
    /// User id of the author.
    #[serde(default)]
    pub auteur: Option<String>,
    #[serde(default)]
    pub categorie: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub statut: StatutArticle,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub date_publication: Option<DateTime<Utc>>,
    /// Estimated reading time in minutes.
    #[serde(default)]
    pub temps_lecture: u32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("titre", &self.titre)?;
        require("slug", &self.slug)?;
        if self.slug != slugify(&self.slug) {
            return Err(ApiError::BadRequest(
                "`slug` may only contain lowercase letters, digits and dashes".to_string(),
            ));
        }
        if let Some(image) = &self.image {
            require_reference("image", image)?;
        }
        Ok(())
    }

    pub fn is_published(&self) -> bool {
        self.statut == StatutArticle::Publie
    }

    /// Recomputes derived fields and stamps the first publication date.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        self.temps_lecture = reading_time(&self.contenu);
        if self.is_published() && self.date_publication.is_none() {
            self.date_publication = Some(now);
        }
    }
}

/// Builds a URL slug: lowercase ASCII, French accents folded, every other run
/// of characters collapsed into a single dash.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        let folded: &str = match ch {
            'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => "a",
            'é' | 'è' | 'ê' | 'ë' => "e",
            'î' | 'ï' | 'í' | 'ì' => "i",
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => "o",
            'ù' | 'û' | 'ü' | 'ú' => "u",
            'ÿ' | 'ý' => "y",
            'ç' => "c",
            'ñ' => "n",
            'œ' => "oe",
            'æ' => "ae",
            c if c.is_ascii_alphanumeric() => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
                continue;
            }
            _ => {
                pending_dash = true;
                continue;
            }
        };
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push_str(folded);
    }
    slug
}

/// Reading time in whole minutes, never below one.
pub fn reading_time(contenu: &str) -> u32 {
    let words = contenu.split_whitespace().count();
    u32::try_from(words.div_ceil(WORDS_PER_MINUTE).max(1)).unwrap_or(u32::MAX)
}

/// CreateArticleRequest
///
/// Input payload for POST /api/articles. The slug is derived from `titre` when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateArticleRequest {
    pub titre: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub extrait: Option<String>,
    #[serde(default)]
    pub contenu: String,
    #[serde(default)]
    pub categorie: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub statut: StatutArticle,
}

impl CreateArticleRequest {
    pub fn into_article(self, id: String, auteur: Option<String>, now: DateTime<Utc>) -> Article {
        let slug = match clean(self.slug) {
            Some(slug) => slugify(&slug),
            None => slugify(&self.titre),
        };
        let mut article = Article {
            id,
            titre: self.titre.trim().to_string(),
            slug,
            extrait: clean(self.extrait),
            contenu: self.contenu,
            auteur,
            categorie: clean(self.categorie),
            tags: normalize_tags(self.tags),
            image: clean(self.image),
            statut: self.statut,
            date_publication: None,
            temps_lecture: 0,
            created_at: now,
            updated_at: now,
        };
        article.refresh(now);
        article
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateArticleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extrait: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contenu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statut: Option<StatutArticle>,
}

impl UpdateArticleRequest {
    pub fn apply(self, article: &mut Article, now: DateTime<Utc>) {
        if let Some(titre) = self.titre {
            article.titre = titre.trim().to_string();
        }
        if let Some(slug) = self.slug {
            article.slug = slugify(&slug);
        }
        if let Some(extrait) = self.extrait {
            article.extrait = clean(Some(extrait));
        }
        if let Some(contenu) = self.contenu {
            article.contenu = contenu;
        }
        if let Some(categorie) = self.categorie {
            article.categorie = clean(Some(categorie));
        }
        if let Some(tags) = self.tags {
            article.tags = normalize_tags(tags);
        }
        if let Some(image) = self.image {
            article.image = clean(Some(image));
        }
        if let Some(statut) = self.statut {
            article.statut = statut;
        }
        article.updated_at = now;
        article.refresh(now);
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ArticleFilter {
    /// Case-insensitive match on titre or extrait.
    pub search: Option<String>,
    pub categorie: Option<String>,
    pub tag: Option<String>,
    /// Ignored on the public blog, which always shows published articles only.
    pub statut: Option<StatutArticle>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}
