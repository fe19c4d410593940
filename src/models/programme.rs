use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use super::{clean, require, require_non_negative, require_reference};
use crate::error::ApiError;

/// Modalite
///
/// How a programme is delivered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Modalite {
    #[default]
    Presentiel,
    Distanciel,
    Mixte,
}

/// ModuleFormation
///
/// One teaching unit inside a programme's syllabus.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[ts(export)]
pub struct ModuleFormation {
    pub titre: String,
    #[serde(default)]
    pub duree_heures: f64,
    #[serde(default)]
    pub contenu: Option<String>,
}

/// Programme
///
/// A catalogue entry stored in the `programmes` collection. Only programmes with
/// `est_publie = true` are visible on the public catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[ts(export)]
pub struct Programme {
    pub id: String,
    /// Unique catalogue code, stored upper-cased (e.g. "BUR-EXCEL-01").
    pub code_formation: String,
    pub titre: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categorie: Option<String>,
    #[serde(default)]
    pub niveau: Option<String>,
    #[serde(default)]
    pub modalite: Modalite,
    #[serde(default)]
    pub duree_heures: f64,
    #[serde(default)]
    pub prix: Option<f64>,
    #[serde(default)]
    pub objectifs: Vec<String>,
    #[serde(default)]
    pub prerequis: Vec<String>,
    #[serde(default)]
    pub modules: Vec<ModuleFormation>,
    /// Media id of the cover image.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub est_publie: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Programme {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("code_formation", &self.code_formation)?;
        require("titre", &self.titre)?;
        require_non_negative("duree_heures", self.duree_heures)?;
        if let Some(prix) = self.prix {
            require_non_negative("prix", prix)?;
        }
        for module in &self.modules {
            require("modules.titre", &module.titre)?;
            require_non_negative("modules.duree_heures", module.duree_heures)?;
        }
        if let Some(image) = &self.image {
            require_reference("image", image)?;
        }
        Ok(())
    }
}

pub(crate) fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// CreateProgrammeRequest
///
/// Input payload for POST /api/programmes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateProgrammeRequest {
    pub code_formation: String,
    pub titre: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categorie: Option<String>,
    #[serde(default)]
    pub niveau: Option<String>,
    #[serde(default)]
    pub modalite: Modalite,
    #[serde(default)]
    pub duree_heures: f64,
    #[serde(default)]
    pub prix: Option<f64>,
    #[serde(default)]
    pub objectifs: Vec<String>,
    #[serde(default)]
    pub prerequis: Vec<String>,
    #[serde(default)]
    pub modules: Vec<ModuleFormation>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub est_publie: bool,
}

impl CreateProgrammeRequest {
    pub fn into_programme(self, id: String, now: DateTime<Utc>) -> Programme {
        Programme {
            id,
            code_formation: normalize_code(&self.code_formation),
            titre: self.titre.trim().to_string(),
            description: self.description,
            categorie: clean(self.categorie),
            niveau: clean(self.niveau),
            modalite: self.modalite,
            duree_heures: self.duree_heures,
            prix: self.prix,
            objectifs: self.objectifs,
            prerequis: self.prerequis,
            modules: self.modules,
            image: clean(self.image),
            est_publie: self.est_publie,
            created_at: now,
            updated_at: now,
        }
    }
}

/// UpdateProgrammeRequest
///
/// Partial update payload for PUT /api/programmes/{id}. Absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProgrammeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_formation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub niveau: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalite: Option<Modalite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duree_heures: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prix: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectifs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequis: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<ModuleFormation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub est_publie: Option<bool>,
}

impl UpdateProgrammeRequest {
    pub fn apply(self, programme: &mut Programme, now: DateTime<Utc>) {
        if let Some(code) = self.code_formation {
            programme.code_formation = normalize_code(&code);
        }
        if let Some(titre) = self.titre {
            programme.titre = titre.trim().to_string();
        }
        if let Some(description) = self.description {
            programme.description = description;
        }
        if let Some(categorie) = self.categorie {
            programme.categorie = clean(Some(categorie));
        }
        if let Some(niveau) = self.niveau {
            programme.niveau = clean(Some(niveau));
        }
        if let Some(modalite) = self.modalite {
            programme.modalite = modalite;
        }
        if let Some(duree) = self.duree_heures {
            programme.duree_heures = duree;
        }
        if let Some(prix) = self.prix {
            programme.prix = Some(prix);
        }
        if let Some(objectifs) = self.objectifs {
            programme.objectifs = objectifs;
        }
        if let Some(prerequis) = self.prerequis {
            programme.prerequis = prerequis;
        }
        if let Some(modules) = self.modules {
            programme.modules = modules;
        }
        if let Some(image) = self.image {
            programme.image = clean(Some(image));
        }
        if let Some(est_publie) = self.est_publie {
            programme.est_publie = est_publie;
        }
        programme.updated_at = now;
    }
}

/// ProgrammeFilter
///
/// Query parameters for the programme listings.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ProgrammeFilter {
    /// Case-insensitive match on titre, code_formation or description.
    pub search: Option<String>,
    pub categorie: Option<String>,
    pub modalite: Option<Modalite>,
    /// Ignored on the public catalogue, which always shows published programmes only.
    pub publie: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}
