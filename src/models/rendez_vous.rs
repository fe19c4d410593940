use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use super::{clean, normalize_email, require, require_email, require_reference};
use crate::error::ApiError;

/// Opening hours for bookable appointments: 30-minute slots from 09:00, the
/// last one starting at 17:30, Monday to Friday.
pub const OPENING_HOUR: u32 = 9;
pub const CLOSING_HOUR: u32 = 18;
pub const SLOT_MINUTES: u32 = 30;
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TypeRendezVous {
    #[default]
    Information,
    Positionnement,
    Inscription,
    Suivi,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ModaliteRendezVous {
    #[default]
    Presentiel,
    Visio,
    Telephone,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StatutRendezVous {
    #[default]
    EnAttente,
    Confirme,
    Annule,
    Termine,
}

impl StatutRendezVous {
    /// en_attente → confirme | annule, confirme → termine | annule.
    /// `annule` and `termine` are final.
    pub fn can_transition_to(self, next: StatutRendezVous) -> bool {
        use StatutRendezVous::*;
        matches!(
            (self, next),
            (EnAttente, Confirme) | (EnAttente, Annule) | (Confirme, Termine) | (Confirme, Annule)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatutRendezVous::EnAttente => "en_attente",
            StatutRendezVous::Confirme => "confirme",
            StatutRendezVous::Annule => "annule",
            StatutRendezVous::Termine => "termine",
        }
    }
}

/// Where the request came from. Contact-form requests do not hold a slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OrigineRendezVous {
    #[default]
    Reservation,
    Contact,
}

/// RendezVous
///
/// An appointment linking a contact to a training programme and a time slot,
/// stored in the `rendez-vous` collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[ts(export)]
pub struct RendezVous {
    pub id: String,
    pub nom: String,
    #[serde(default)]
    pub prenom: Option<String>,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub programme: Option<String>,
    #[serde(default)]
    pub type_rdv: TypeRendezVous,
    pub date: NaiveDate,
    /// Local start time, "HH:MM".
    pub heure: String,
    #[serde(default = "default_duration")]
    pub duree_minutes: u32,
    #[serde(default)]
    pub modalite: ModaliteRendezVous,
    #[serde(default)]
    pub statut: StatutRendezVous,
    #[serde(default)]
    pub origine: OrigineRendezVous,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub notes_internes: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

impl RendezVous {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("nom", &self.nom)?;
        require_email("email", &self.email)?;
        if let Some(programme) = &self.programme {
            require_reference("programme", programme)?;
        }
        if format_heure(parse_heure(&self.heure)?) != self.heure {
            return Err(ApiError::BadRequest(
                "`heure` must use the HH:MM format".to_string(),
            ));
        }
        if !(5..=480).contains(&self.duree_minutes) {
            return Err(ApiError::BadRequest(
                "`duree_minutes` must be between 5 and 480".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether this appointment occupies its slot in the booking calendar.
    pub fn holds_slot(&self) -> bool {
        self.origine == OrigineRendezVous::Reservation && self.statut != StatutRendezVous::Annule
    }

    /// `date@heure` while the appointment holds its slot. Stored alongside the
    /// record so the store can refuse a second live booking of the same slot.
    pub fn slot_key(&self) -> Option<String> {
        self.holds_slot()
            .then(|| format!("{}@{}", self.date, self.heure))
    }
}

pub fn parse_heure(value: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ApiError::BadRequest("`heure` must use the HH:MM format".to_string()))
}

pub fn format_heure(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Rewrites a parseable time as "HH:MM" ("9:0" -> "09:00"). Anything else is
/// only trimmed and left for `validate` to reject.
pub fn canonical_heure(value: &str) -> String {
    match parse_heure(value) {
        Ok(time) => format_heure(time),
        Err(_) => value.trim().to_string(),
    }
}

/// All bookable slot start times for `date`. Empty on weekends.
pub fn opening_slots(date: NaiveDate) -> Vec<NaiveTime> {
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return Vec::new();
    }
    (OPENING_HOUR * 60..CLOSING_HOUR * 60)
        .step_by(SLOT_MINUTES as usize)
        .filter_map(|minutes| NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0))
        .collect()
}

/// Checks that `date`/`heure` is an opening-hours slot that has not started yet.
pub fn check_bookable(date: NaiveDate, heure: &str, now: NaiveDateTime) -> Result<NaiveTime, ApiError> {
    let time = parse_heure(heure)?;
    if !opening_slots(date).contains(&time) {
        return Err(ApiError::BadRequest(
            "the requested slot is outside opening hours".to_string(),
        ));
    }
    if date.and_time(time) <= now {
        return Err(ApiError::BadRequest(
            "the requested slot is in the past".to_string(),
        ));
    }
    Ok(time)
}

/// CreateRendezVousRequest
///
/// Public booking payload for POST /api/rendez-vous.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateRendezVousRequest {
    pub nom: String,
    #[serde(default)]
    pub prenom: Option<String>,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub programme: Option<String>,
    #[serde(default)]
    pub type_rdv: TypeRendezVous,
    pub date: NaiveDate,
    pub heure: String,
    #[serde(default)]
    pub duree_minutes: Option<u32>,
    #[serde(default)]
    pub modalite: ModaliteRendezVous,
    #[serde(default)]
    pub message: Option<String>,
}

impl CreateRendezVousRequest {
    pub fn into_rendez_vous(self, id: String, now: DateTime<Utc>) -> RendezVous {
        RendezVous {
            id,
            nom: self.nom.trim().to_string(),
            prenom: clean(self.prenom),
            email: normalize_email(&self.email),
            telephone: clean(self.telephone),
            programme: clean(self.programme),
            type_rdv: self.type_rdv,
            date: self.date,
            heure: canonical_heure(&self.heure),
            duree_minutes: self.duree_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            modalite: self.modalite,
            statut: StatutRendezVous::EnAttente,
            origine: OrigineRendezVous::Reservation,
            message: clean(self.message),
            notes_internes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// ContactRequest
///
/// Contact form payload (POST /api/contact), kept as an information request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContactRequest {
    pub nom: String,
    #[serde(default)]
    pub prenom: Option<String>,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub programme: Option<String>,
    pub message: String,
}

impl ContactRequest {
    pub fn into_rendez_vous(self, id: String, now: DateTime<Utc>, local_now: NaiveDateTime) -> RendezVous {
        RendezVous {
            id,
            nom: self.nom.trim().to_string(),
            prenom: clean(self.prenom),
            email: normalize_email(&self.email),
            telephone: clean(self.telephone),
            programme: clean(self.programme),
            type_rdv: TypeRendezVous::Information,
            date: local_now.date(),
            heure: format_heure(local_now.time()),
            duree_minutes: DEFAULT_DURATION_MINUTES,
            modalite: ModaliteRendezVous::Telephone,
            statut: StatutRendezVous::EnAttente,
            origine: OrigineRendezVous::Contact,
            message: Some(self.message.trim().to_string()),
            notes_internes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// UpdateRendezVousRequest
///
/// Back-office edit (PUT /api/rendez-vous/{id}). Status changes go through the
/// dedicated PATCH endpoint so transitions are checked.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateRendezVousRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub programme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_rdv: Option<TypeRendezVous>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duree_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalite: Option<ModaliteRendezVous>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes_internes: Option<String>,
}

impl UpdateRendezVousRequest {
    /// True when the update moves the appointment to another slot.
    pub fn reschedules(&self, current: &RendezVous) -> bool {
        self.date.is_some_and(|date| date != current.date)
            || self
                .heure
                .as_deref()
                .is_some_and(|heure| canonical_heure(heure) != current.heure)
    }

    pub fn apply(self, rdv: &mut RendezVous, now: DateTime<Utc>) {
        if let Some(nom) = self.nom {
            rdv.nom = nom.trim().to_string();
        }
        if let Some(prenom) = self.prenom {
            rdv.prenom = clean(Some(prenom));
        }
        if let Some(email) = self.email {
            rdv.email = normalize_email(&email);
        }
        if let Some(telephone) = self.telephone {
            rdv.telephone = clean(Some(telephone));
        }
        if let Some(programme) = self.programme {
            rdv.programme = clean(Some(programme));
        }
        if let Some(type_rdv) = self.type_rdv {
            rdv.type_rdv = type_rdv;
        }
        if let Some(date) = self.date {
            rdv.date = date;
        }
        if let Some(heure) = self.heure {
            rdv.heure = canonical_heure(&heure);
        }
        if let Some(duree) = self.duree_minutes {
            rdv.duree_minutes = duree;
        }
        if let Some(modalite) = self.modalite {
            rdv.modalite = modalite;
        }
        if let Some(message) = self.message {
            rdv.message = clean(Some(message));
        }
        if let Some(notes) = self.notes_internes {
            rdv.notes_internes = clean(Some(notes));
        }
        rdv.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateStatutRequest {
    pub statut: StatutRendezVous,
}

#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct RendezVousFilter {
    pub statut: Option<StatutRendezVous>,
    pub type_rdv: Option<TypeRendezVous>,
    /// Exact day (YYYY-MM-DD).
    pub date: Option<NaiveDate>,
    /// Appointments on or after this day.
    pub date_from: Option<NaiveDate>,
    pub programme: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CreneauxQuery {
    /// Day to inspect (YYYY-MM-DD).
    pub date: String,
}

/// Creneau
///
/// One slot of the public booking calendar.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct Creneau {
    pub heure: String,
    pub disponible: bool,
}
