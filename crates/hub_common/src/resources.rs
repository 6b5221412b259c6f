//! Company resource library: files in blob storage with a metadata row each.

use crate::store::{fetch, fetch_one, insert_one, BlobStore, DataStore, Filter, Query};
use chrono::{DateTime, Utc};
use hub_shared::model::tables;
use hub_shared::{CompanyResource, HubError};
use serde::Serialize;
use tracing::{info, warn};

pub const RESOURCE_BUCKET: &str = "company-resources";

/// Stored object name: upload time in millis plus the original extension
pub fn object_name(file_name: &str, now: DateTime<Utc>) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}.{}", now.timestamp_millis(), ext.to_lowercase())
        }
        _ => now.timestamp_millis().to_string(),
    }
}

/// Guess a MIME type from the extension
pub fn file_type(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_lowercase();
    Some(match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    })
}

#[derive(Debug, Serialize)]
struct NewResource<'a> {
    company_id: &'a str,
    file_name: &'a str,
    file_path: &'a str,
    file_type: Option<&'a str>,
    file_size: u64,
    uploaded_by: &'a str,
}

pub async fn list_resources<S: DataStore + ?Sized>(
    store: &S,
    company_id: Option<&str>,
) -> Result<Vec<CompanyResource>, HubError> {
    let mut query = Query::from(tables::COMPANY_RESOURCES).order("created_at", false);
    if let Some(company) = company_id {
        query = query.eq("company_id", company);
    }
    fetch(store, &query).await
}

/// Store the bytes, then record the row. A failed insert removes the stored object.
#[allow(clippy::too_many_arguments)]
pub async fn upload_resource<S, B>(
    store: &S,
    blobs: &B,
    bucket: &str,
    company_id: &str,
    uploaded_by: &str,
    file_name: &str,
    bytes: Vec<u8>,
    now: DateTime<Utc>,
) -> Result<CompanyResource, HubError>
where
    S: DataStore + ?Sized,
    B: BlobStore + ?Sized,
{
    if file_name.trim().is_empty() {
        return Err(HubError::Validation("file name is required".to_string()));
    }
    let path = object_name(file_name, now);
    let size = bytes.len() as u64;
    blobs.upload(bucket, &path, bytes).await?;

    let record = NewResource {
        company_id,
        file_name,
        file_path: &path,
        file_type: file_type(file_name),
        file_size: size,
        uploaded_by,
    };
    match insert_one::<_, CompanyResource, _>(store, tables::COMPANY_RESOURCES, &record).await {
        Ok(resource) => {
            info!("uploaded {} as {} ({} bytes)", file_name, path, size);
            Ok(resource)
        }
        Err(e) => {
            warn!("recording {} failed, removing stored object: {}", file_name, e);
            if let Err(cleanup) = blobs.remove(bucket, &[path.clone()]).await {
                warn!("could not remove {}: {}", path, cleanup);
            }
            Err(e)
        }
    }
}

async fn find<S: DataStore + ?Sized>(store: &S, resource_id: &str) -> Result<CompanyResource, HubError> {
    fetch_one(store, Query::from(tables::COMPANY_RESOURCES).eq("id", resource_id))
        .await?
        .ok_or_else(|| HubError::NotFound(format!("resource {}", resource_id)))
}

pub async fn download_resource<S, B>(
    store: &S,
    blobs: &B,
    bucket: &str,
    resource_id: &str,
) -> Result<(CompanyResource, Vec<u8>), HubError>
where
    S: DataStore + ?Sized,
    B: BlobStore + ?Sized,
{
    let resource = find(store, resource_id).await?;
    let bytes = blobs.download(bucket, &resource.file_path).await?;
    Ok((resource, bytes))
}

/// Object first, then the row
pub async fn remove_resource<S, B>(store: &S, blobs: &B, bucket: &str, resource_id: &str) -> Result<(), HubError>
where
    S: DataStore + ?Sized,
    B: BlobStore + ?Sized,
{
    let resource = find(store, resource_id).await?;
    blobs.remove(bucket, &[resource.file_path.clone()]).await?;
    store
        .delete(tables::COMPANY_RESOURCES, &[Filter::eq("id", resource_id)])
        .await?;
    info!("removed resource {} ({})", resource_id, resource.file_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_object_name_keeps_extension() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(object_name("Handbook.PDF", now), format!("{}.pdf", now.timestamp_millis()));
        assert_eq!(object_name("README", now), now.timestamp_millis().to_string());
    }

    #[test]
    fn test_file_type() {
        assert_eq!(file_type("a.pdf"), Some("application/pdf"));
        assert_eq!(file_type("a.bin"), None);
        assert_eq!(file_type("noext"), None);
    }
}
