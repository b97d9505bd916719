use actix_web::{delete, get, put, web, HttpResponse};
use actix_web::web::Data;
use blob_store::{ChunkStores, ChunkedBlobStore};
use serde::{Deserialize, Serialize};
use crate::errors::ServerErr;

pub const APP_TYPE_JSON: &str = "application/json";
pub const APP_TYPE_OCTET_STREAM: &str = "application/octet-stream";

pub struct AppState {
    pub(crate) store: ChunkedBlobStore<ChunkStores>,
}

#[derive(Serialize, Deserialize)]
struct Health {
    status: String,
}

#[derive(Deserialize)]
struct WriteParams {
    chunk_size: Option<u64>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(list_blobs)
        .service(blob_metadata)
        .service(get_blob)
        .service(put_blob)
        .service(delete_blob);
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(APP_TYPE_JSON)
        .json(Health { status: "ok".to_string() })
}

#[get("/blobs")]
async fn list_blobs(shared_state: Data<AppState>) -> Result<HttpResponse, ServerErr> {
    let blobs = shared_state.store.list().await?;
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(blobs))
}

#[get("/blobs/{id}/meta")]
async fn blob_metadata(
    id: web::Path<String>,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, ServerErr> {
    let meta = shared_state.store.metadata(&id).await?;
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(meta))
}

/// Drains the whole object through a read handle and answers with the bytes.
#[get("/blobs/{id}")]
async fn get_blob(
    id: web::Path<String>,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, ServerErr> {
    let store = &shared_state.store;
    let mut handle = store.open_for_read(&id).await?;
    let read = store.read_to_end(&mut handle).await;
    store.close(&mut handle);

    let data = read?;
    tracing::debug!("served {} ({} bytes)", id, data.len());
    Ok(HttpResponse::Ok().content_type(APP_TYPE_OCTET_STREAM).body(data))
}

/// Replaces the object with the request body, chunked by `chunk_size` or the configured default.
#[put("/blobs/{id}")]
async fn put_blob(
    id: web::Path<String>,
    params: web::Query<WriteParams>,
    body: web::Bytes,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, ServerErr> {
    let store = &shared_state.store;
    let mut handle = match params.chunk_size {
        Some(chunk_size) => store.open_for_write(&id, chunk_size)?,
        None => store.open_for_write_default(&id)?,
    };
    let written = store.write(&mut handle, &body).await;
    store.close(&mut handle);

    let blob = written?;
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(blob))
}

#[delete("/blobs/{id}")]
async fn delete_blob(
    id: web::Path<String>,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, ServerErr> {
    shared_state.store.delete(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use blob_store::{BlobHandle, BlobMetadata, MemoryChunkStore, StoreConfig};

    fn state() -> Data<AppState> {
        Data::new(AppState {
            store: ChunkedBlobStore::new(ChunkStores::Memory(MemoryChunkStore::new()), StoreConfig::default()),
        })
    }

    #[actix_web::test]
    async fn test_put_then_get() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::put()
            .uri("/blobs/doc?chunk_size=4")
            .set_payload("0123456789")
            .to_request();
        let blob: BlobHandle = test::call_and_read_body_json(&app, req).await;
        assert_eq!(blob.total_size, 10);
        assert_eq!(blob.chunk_count, 3);

        let req = test::TestRequest::get().uri("/blobs/doc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, web::Bytes::from_static(b"0123456789"));
    }

    #[actix_web::test]
    async fn test_metadata_and_listing() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        for id in ["b", "a"] {
            let req = test::TestRequest::put().uri(&format!("/blobs/{}", id)).set_payload("xyz").to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/blobs/a/meta").to_request();
        let meta: BlobMetadata = test::call_and_read_body_json(&app, req).await;
        assert_eq!(meta.total_size, 3);
        assert_eq!(meta.chunk_size, 358_400);

        let req = test::TestRequest::get().uri("/blobs").to_request();
        let listed: Vec<BlobHandle> = test::call_and_read_body_json(&app, req).await;
        let ids: Vec<&str> = listed.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[actix_web::test]
    async fn test_errors_map_to_statuses() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/blobs/missing").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put().uri("/blobs/doc?chunk_size=0").set_payload("x").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete().uri("/blobs/missing").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_delete_then_get() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::put().uri("/blobs/doc").set_payload("hello").to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::delete().uri("/blobs/doc").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri("/blobs/doc").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let health: Health = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health.status, "ok");
    }
}
