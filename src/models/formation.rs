use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use super::{clean, require, require_non_negative, require_reference};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StatutFormation {
    #[default]
    Brouillon,
    Validee,
    EnCours,
    Terminee,
    Annulee,
}

/// FormationPersonnalisee
///
/// A training plan tailored to one learner, stored in `formations_personnalisees`.
/// `apprenant` and `programme` are loose references (ids) into their collections.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[ts(export)]
pub struct FormationPersonnalisee {
    pub id: String,
    pub apprenant: String,
    /// Catalogue programme this plan is derived from, if any.
    #[serde(default)]
    pub programme: Option<String>,
    pub titre: String,
    #[serde(default)]
    pub objectifs: Vec<String>,
    #[serde(default)]
    pub duree_heures: f64,
    #[serde(default)]
    pub date_debut: Option<NaiveDate>,
    #[serde(default)]
    pub date_fin: Option<NaiveDate>,
    #[serde(default)]
    pub tarif: Option<f64>,
    #[serde(default)]
    pub statut: StatutFormation,
    #[serde(default)]
    pub notes: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl FormationPersonnalisee {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_reference("apprenant", &self.apprenant)?;
        if let Some(programme) = &self.programme {
            require_reference("programme", programme)?;
        }
        require("titre", &self.titre)?;
        require_non_negative("duree_heures", self.duree_heures)?;
        if let Some(tarif) = self.tarif {
            require_non_negative("tarif", tarif)?;
        }
        if let (Some(debut), Some(fin)) = (self.date_debut, self.date_fin) {
            if fin < debut {
                return Err(ApiError::BadRequest(
                    "`date_fin` cannot be earlier than `date_debut`".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// CreateFormationRequest
///
/// Input payload for POST /api/formations-personnalisees.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateFormationRequest {
    pub apprenant: String,
    #[serde(default)]
    pub programme: Option<String>,
    pub titre: String,
    #[serde(default)]
    pub objectifs: Vec<String>,
    #[serde(default)]
    pub duree_heures: f64,
    #[serde(default)]
    pub date_debut: Option<NaiveDate>,
    #[serde(default)]
    pub date_fin: Option<NaiveDate>,
    #[serde(default)]
    pub tarif: Option<f64>,
    #[serde(default)]
    pub statut: StatutFormation,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateFormationRequest {
    pub fn into_formation(self, id: String, now: DateTime<Utc>) -> FormationPersonnalisee {
        FormationPersonnalisee {
            id,
            apprenant: self.apprenant.trim().to_string(),
            programme: clean(self.programme),
            titre: self.titre.trim().to_string(),
            objectifs: self.objectifs,
            duree_heures: self.duree_heures,
            date_debut: self.date_debut,
            date_fin: self.date_fin,
            tarif: self.tarif,
            statut: self.statut,
            notes: clean(self.notes),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateFormationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apprenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub programme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectifs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duree_heures: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_debut: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_fin: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tarif: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statut: Option<StatutFormation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl UpdateFormationRequest {
    pub fn apply(self, formation: &mut FormationPersonnalisee, now: DateTime<Utc>) {
        if let Some(apprenant) = self.apprenant {
            formation.apprenant = apprenant.trim().to_string();
        }
        if let Some(programme) = self.programme {
            formation.programme = clean(Some(programme));
        }
        if let Some(titre) = self.titre {
            formation.titre = titre.trim().to_string();
        }
        if let Some(objectifs) = self.objectifs {
            formation.objectifs = objectifs;
        }
        if let Some(duree) = self.duree_heures {
            formation.duree_heures = duree;
        }
        if let Some(debut) = self.date_debut {
            formation.date_debut = Some(debut);
        }
        if let Some(fin) = self.date_fin {
            formation.date_fin = Some(fin);
        }
        if let Some(tarif) = self.tarif {
            formation.tarif = Some(tarif);
        }
        if let Some(statut) = self.statut {
            formation.statut = statut;
        }
        if let Some(notes) = self.notes {
            formation.notes = clean(Some(notes));
        }
        formation.updated_at = now;
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct FormationFilter {
    pub apprenant: Option<String>,
    pub programme: Option<String>,
    pub statut: Option<StatutFormation>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}
