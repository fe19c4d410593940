use axum::extract::{Path, State};
use chrono::{Local, NaiveDate, Utc};

use super::{ApiResult, Deleted, deleted, found, ok};
use crate::{
    auth::AuthUser,
    error::{ApiError, RepoError},
    extract::{ApiJson, ApiQuery},
    models::{
        self, ApiResponse, ContactRequest, CreateRendezVousRequest, Creneau, CreneauxQuery,
        ErrorEnvelope, PageRequest, RendezVous, RendezVousFilter,
        UpdateRendezVousRequest, UpdateStatutRequest,
        rendez_vous::{check_bookable, format_heure, opening_slots},
    },
    repository::RepositoryState,
};

/// Fails with 409 when another live booking already holds `rdv`'s slot.
async fn ensure_slot_free(
    repo: &RepositoryState,
    rdv: &RendezVous,
    excluding: Option<&str>,
) -> Result<(), ApiError> {
    let booked = repo.booked_slots(rdv.date, excluding).await?;
    if booked.iter().any(|heure| *heure == rdv.heure) {
        return Err(slot_taken(rdv));
    }
    Ok(())
}

fn slot_taken(rdv: &RendezVous) -> ApiError {
    ApiError::Conflict(format!(
        "the {} {} slot is already booked",
        rdv.date, rdv.heure
    ))
}

/// A concurrent booking can still win between the check and the write; the
/// store's slot guard reports it as a duplicate `slot_key`.
fn on_write(rdv: &RendezVous) -> impl FnOnce(RepoError) -> ApiError + '_ {
    move |err| match err {
        RepoError::Duplicate { field } if field == "slot_key" => slot_taken(rdv),
        other => other.into(),
    }
}

/// get_creneaux
///
/// [Public Route] The booking calendar for one day: every 30-minute opening
/// slot with its availability. Weekends have no slots. Slots that already
/// started are reported unavailable.
#[utoipa::path(
    get,
    path = "/api/rendez-vous/creneaux",
    params(CreneauxQuery),
    responses(
        (status = 200, description = "Slots of the day", body = ApiResponse<Vec<Creneau>>),
        (status = 400, description = "Malformed date", body = ErrorEnvelope)
    )
)]
pub async fn get_creneaux(
    State(repo): State<RepositoryState>,
    ApiQuery(query): ApiQuery<CreneauxQuery>,
) -> ApiResult<Vec<Creneau>> {
    let date = NaiveDate::parse_from_str(query.date.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("`date` must use the YYYY-MM-DD format".to_string()))?;

    let slots = opening_slots(date);
    if slots.is_empty() {
        return ok(Vec::new());
    }

    let booked = repo.booked_slots(date, None).await?;
    let now = Local::now().naive_local();

    let creneaux = slots
        .into_iter()
        .map(|time| {
            let heure = format_heure(time);
            let disponible = date.and_time(time) > now && !booked.contains(&heure);
            Creneau { heure, disponible }
        })
        .collect();
    ok(creneaux)
}

/// book_rendez_vous
///
/// [Public Route] Books a slot from the public calendar.
///
/// Past slots and slots outside opening hours answer 400; a slot already held
/// by a live booking answers 409. New bookings start `en_attente`.
#[utoipa::path(
    post,
    path = "/api/rendez-vous",
    request_body = CreateRendezVousRequest,
    responses(
        (status = 200, description = "Booked", body = ApiResponse<RendezVous>),
        (status = 400, description = "Invalid or past slot", body = ErrorEnvelope),
        (status = 409, description = "Slot already booked", body = ErrorEnvelope)
    )
)]
pub async fn book_rendez_vous(
    State(repo): State<RepositoryState>,
    ApiJson(payload): ApiJson<CreateRendezVousRequest>,
) -> ApiResult<RendezVous> {
    let rdv = payload.into_rendez_vous(models::new_id(), Utc::now());
    rdv.validate()?;
    check_bookable(rdv.date, &rdv.heure, Local::now().naive_local())?;
    ensure_slot_free(&repo, &rdv, None).await?;
    repo.insert_rendez_vous(&rdv).await.map_err(on_write(&rdv))?;

    tracing::info!(rdv_id = %rdv.id, date = %rdv.date, heure = %rdv.heure, "rendez-vous booked");
    ok(rdv)
}

/// submit_contact
///
/// [Public Route] Contact form. Kept as an information request dated at
/// submission time; it never takes a slot in the booking calendar.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message recorded", body = ApiResponse<RendezVous>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope)
    )
)]
pub async fn submit_contact(
    State(repo): State<RepositoryState>,
    ApiJson(payload): ApiJson<ContactRequest>,
) -> ApiResult<RendezVous> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("`message` is required".to_string()));
    }
    let rdv = payload.into_rendez_vous(models::new_id(), Utc::now(), Local::now().naive_local());
    rdv.validate()?;
    repo.insert_rendez_vous(&rdv).await?;

    tracing::info!(rdv_id = %rdv.id, "contact request recorded");
    ok(rdv)
}

#[utoipa::path(
    get,
    path = "/api/rendez-vous",
    params(RendezVousFilter),
    responses(
        (status = 200, description = "Appointments", body = ApiResponse<Vec<RendezVous>>),
        (status = 503, description = "Store unreachable", body = ErrorEnvelope)
    )
)]
pub async fn list_rendez_vous(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    ApiQuery(filter): ApiQuery<RendezVousFilter>,
) -> ApiResult<Vec<RendezVous>> {
    let page = PageRequest::new(filter.page, filter.limit);
    let rdvs = repo.list_rendez_vous(&filter, page).await?;
    Ok(axum::Json(ApiResponse::paginated(rdvs, page)))
}

#[utoipa::path(
    get,
    path = "/api/rendez-vous/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Found", body = ApiResponse<RendezVous>),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn get_rendez_vous(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
) -> ApiResult<RendezVous> {
    ok(found(repo.get_rendez_vous(&id).await?, "rendez-vous")?)
}

/// update_rendez_vous
///
/// [Authenticated Route] Back-office edit. Moving a booking to another slot
/// goes through the same checks as a public booking, ignoring the booking
/// itself.
#[utoipa::path(
    put,
    path = "/api/rendez-vous/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = UpdateRendezVousRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<RendezVous>),
        (status = 400, description = "Invalid or past slot", body = ErrorEnvelope),
        (status = 404, description = "Not found", body = ErrorEnvelope),
        (status = 409, description = "Slot already booked", body = ErrorEnvelope)
    )
)]
pub async fn update_rendez_vous(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateRendezVousRequest>,
) -> ApiResult<RendezVous> {
    let mut rdv = found(repo.get_rendez_vous(&id).await?, "rendez-vous")?;
    let reschedules = payload.reschedules(&rdv);

    payload.apply(&mut rdv, Utc::now());
    rdv.validate()?;

    if reschedules && rdv.holds_slot() {
        check_bookable(rdv.date, &rdv.heure, Local::now().naive_local())?;
        ensure_slot_free(&repo, &rdv, Some(rdv.id.as_str())).await?;
    }

    if !repo.replace_rendez_vous(&rdv).await.map_err(on_write(&rdv))? {
        return Err(ApiError::not_found("rendez-vous"));
    }
    ok(rdv)
}

/// update_statut
///
/// [Authenticated Route] Moves an appointment through its lifecycle:
/// `en_attente -> confirme | annule`, `confirme -> termine | annule`.
/// Any other move answers 409.
#[utoipa::path(
    patch,
    path = "/api/rendez-vous/{id}/statut",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = UpdateStatutRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<RendezVous>),
        (status = 404, description = "Not found", body = ErrorEnvelope),
        (status = 409, description = "Transition not allowed", body = ErrorEnvelope)
    )
)]
pub async fn update_statut(
    AuthUser { id: user_id, .. }: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateStatutRequest>,
) -> ApiResult<RendezVous> {
    let mut rdv = found(repo.get_rendez_vous(&id).await?, "rendez-vous")?;

    if !rdv.statut.can_transition_to(payload.statut) {
        return Err(ApiError::Conflict(format!(
            "cannot move a rendez-vous from `{}` to `{}`",
            rdv.statut.as_str(),
            payload.statut.as_str()
        )));
    }

    // `annule` is final, so no transition can reclaim a slot someone else took.
    let previous = rdv.statut;
    rdv.statut = payload.statut;
    rdv.updated_at = Utc::now();

    if !repo.replace_rendez_vous(&rdv).await? {
        return Err(ApiError::not_found("rendez-vous"));
    }

    tracing::info!(rdv_id = %rdv.id, from = previous.as_str(), to = rdv.statut.as_str(), %user_id, "rendez-vous status changed");
    ok(rdv)
}

#[utoipa::path(
    delete,
    path = "/api/rendez-vous/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn delete_rendez_vous(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let removed = repo.delete_rendez_vous(&id).await?;
    deleted(removed, id, "rendez-vous")
}
