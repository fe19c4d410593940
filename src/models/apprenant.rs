use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use super::{clean, normalize_email, require, require_email, require_reference};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StatutApprenant {
    #[default]
    Prospect,
    Inscrit,
    EnFormation,
    Diplome,
    Abandon,
}

/// How the learner's training is paid for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Financement {
    Cpf,
    Opco,
    FranceTravail,
    Entreprise,
    Personnel,
}

/// Apprenant
///
/// A learner record from the `apprenants` collection. `email` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[ts(export)]
pub struct Apprenant {
    pub id: String,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub date_naissance: Option<NaiveDate>,
    #[serde(default)]
    pub adresse: Option<String>,
    #[serde(default)]
    pub entreprise: Option<String>,
    #[serde(default)]
    pub statut: StatutApprenant,
    #[serde(default)]
    pub financement: Option<Financement>,
    /// Ids of the catalogue programmes the learner is enrolled in.
    #[serde(default)]
    pub programmes: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Apprenant {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("nom", &self.nom)?;
        require("prenom", &self.prenom)?;
        require_email("email", &self.email)?;
        for programme in &self.programmes {
            require_reference("programmes", programme)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateApprenantRequest {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub date_naissance: Option<NaiveDate>,
    #[serde(default)]
    pub adresse: Option<String>,
    #[serde(default)]
    pub entreprise: Option<String>,
    #[serde(default)]
    pub statut: StatutApprenant,
    #[serde(default)]
    pub financement: Option<Financement>,
    #[serde(default)]
    pub programmes: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateApprenantRequest {
    pub fn into_apprenant(self, id: String, now: DateTime<Utc>) -> Apprenant {
        Apprenant {
            id,
            nom: self.nom.trim().to_string(),
            prenom: self.prenom.trim().to_string(),
            email: normalize_email(&self.email),
            telephone: clean(self.telephone),
            date_naissance: self.date_naissance,
            adresse: clean(self.adresse),
            entreprise: clean(self.entreprise),
            statut: self.statut,
            financement: self.financement,
            programmes: self.programmes,
            notes: clean(self.notes),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateApprenantRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_naissance: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entreprise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statut: Option<StatutApprenant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financement: Option<Financement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub programmes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl UpdateApprenantRequest {
    pub fn apply(self, apprenant: &mut Apprenant, now: DateTime<Utc>) {
        if let Some(nom) = self.nom {
            apprenant.nom = nom.trim().to_string();
        }
        if let Some(prenom) = self.prenom {
            apprenant.prenom = prenom.trim().to_string();
        }
        if let Some(email) = self.email {
            apprenant.email = normalize_email(&email);
        }
        if let Some(telephone) = self.telephone {
            apprenant.telephone = clean(Some(telephone));
        }
        if let Some(date) = self.date_naissance {
            apprenant.date_naissance = Some(date);
        }
        if let Some(adresse) = self.adresse {
            apprenant.adresse = clean(Some(adresse));
        }
        if let Some(entreprise) = self.entreprise {
            apprenant.entreprise = clean(Some(entreprise));
        }
        if let Some(statut) = self.statut {
            apprenant.statut = statut;
        }
        if let Some(financement) = self.financement {
            apprenant.financement = Some(financement);
        }
        if let Some(programmes) = self.programmes {
            apprenant.programmes = programmes;
        }
        if let Some(notes) = self.notes {
            apprenant.notes = clean(Some(notes));
        }
        apprenant.updated_at = now;
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ApprenantFilter {
    /// Case-insensitive match on nom, prenom or email.
    pub search: Option<String>,
    pub statut: Option<StatutApprenant>,
    /// Only learners enrolled in this programme id.
    pub programme: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}
