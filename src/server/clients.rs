use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireIdentity;
use crate::export::clients_to_csv;
use crate::server::AppState;
use crate::server::dto::{
    ClientDetailResponse, CreateClientRequest, CreateContactRequest, ListClientsParams,
    UpdateClientRequest,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_client_name;
use crate::store::{ClientQuery, DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::types::{Client, ClientStatus, Contact, ContactType};

pub async fn list_clients(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListClientsParams>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    let query = ClientQuery {
        term: params.q,
        status: params.status,
        page: params.page.unwrap_or(DEFAULT_PAGE),
        limit: params.limit.unwrap_or(DEFAULT_LIMIT),
    };

    let page = store
        .list_clients(&identity.id, &query)
        .api_err("Failed to list clients")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(page)))
}

pub async fn create_client(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateClientRequest>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    validate_client_name(&req.name)?;

    let status = match req.status.as_deref() {
        Some(s) => s
            .parse::<ClientStatus>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => ClientStatus::default(),
    };

    let now = Utc::now();
    let client = Client {
        id: Uuid::new_v4().to_string(),
        owner_id: identity.id.clone(),
        name: req.name,
        phone: req.phone,
        email: req.email,
        status,
        notes: req.notes,
        created_at: now,
        updated_at: now,
    };

    store
        .create_client(&client)
        .api_err("Failed to create client")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(client))))
}

pub async fn get_client(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    let client = store
        .get_client(&identity.id, &id)
        .api_err("Failed to get client")?
        .or_not_found("Client not found")?;

    let contacts = store
        .list_client_contacts(&client.id)
        .api_err("Failed to list contact history")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ClientDetailResponse {
        client,
        contacts,
    })))
}

pub async fn update_client(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateClientRequest>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    let mut client = store
        .get_client(&identity.id, &id)
        .api_err("Failed to get client")?
        .or_not_found("Client not found")?;

    if let Some(name) = req.name {
        validate_client_name(&name)?;
        client.name = name;
    }
    if let Some(phone) = req.phone {
        client.phone = Some(phone);
    }
    if let Some(email) = req.email {
        client.email = Some(email);
    }
    if let Some(status) = req.status {
        client.status = status
            .parse()
            .map_err(|e: crate::error::Error| ApiError::bad_request(e.to_string()))?;
    }
    if let Some(notes) = req.notes {
        client.notes = Some(notes);
    }
    client.updated_at = Utc::now();

    store
        .update_client(&client)
        .api_err("Client not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(client)))
}

pub async fn delete_client(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    let deleted = store
        .delete_client(&identity.id, &id)
        .api_err("Failed to delete client")?;

    if !deleted {
        return Err(ApiError::not_found("Client not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn add_contact(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateContactRequest>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    // An interaction can never attach to another owner's client.
    let client = store
        .get_client(&identity.id, &id)
        .api_err("Failed to get client")?
        .or_not_found("Client not found")?;

    let contact_type = match req.contact_type.as_deref() {
        Some(s) => s
            .parse::<ContactType>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => ContactType::default(),
    };

    let now = Utc::now();
    let contact = Contact {
        id: Uuid::new_v4().to_string(),
        client_id: client.id,
        owner_id: identity.id.clone(),
        date: req.date.unwrap_or(now),
        contact_type,
        note: req.note,
        created_at: now,
        updated_at: now,
    };

    store
        .create_contact(&contact)
        .api_err("Failed to record interaction")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(contact))))
}

pub async fn export_clients_csv(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    let clients = store
        .list_all_clients(&identity.id)
        .api_err("Failed to export clients")?;

    let csv = clients_to_csv(&clients).map_err(|e| {
        tracing::error!("CSV export failed: {e}");
        ApiError::internal("Failed to export clients")
    })?;

    Ok::<_, ApiError>((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"clients.csv\"",
            ),
        ],
        csv,
    ))
}
