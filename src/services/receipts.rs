// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Receipt download and merging.
//!
//! Each completed trip has one PDF receipt behind an authenticated GET. The
//! blob cache holds the canonical copy of every downloaded receipt; the
//! caller's destination directory only ever receives disposable copies, so
//! re-downloads after a cache hit never touch the network.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use crate::cookies::CookieJar;
use crate::error::{AppError, Result};
use crate::services::cache::CacheStore;

const DEFAULT_MERGED_NAME: &str = "merged_receipt.pdf";

/// Page-tree keys a page may inherit from its parent nodes. Reparenting a
/// page into the merged document loses that chain, so the values are copied
/// down onto the page first.
const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Receipt download/merge service.
#[derive(Clone)]
pub struct ReceiptService {
    http: reqwest::Client,
    base_url: String,
    cache: CacheStore,
}

impl ReceiptService {
    pub fn new(base_url: impl Into<String>, cache: CacheStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            cache,
        }
    }

    /// Fetch one trip's receipt into `dest_dir/{trip_uuid}.pdf`.
    ///
    /// Consults the blob cache first; only a miss hits the network. The
    /// downloaded bytes are written into the cache (best-effort) and then
    /// copied out to the destination.
    pub async fn fetch_receipt(
        &self,
        trip_uuid: &str,
        cookies: &CookieJar,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let dest_path = dest_dir.join(format!("{}.pdf", trip_uuid));

        if let Some(bytes) = self.cache.get_receipt(trip_uuid).await? {
            tracing::debug!(trip_uuid, "Receipt cache hit");
            tokio::fs::write(&dest_path, &bytes).await?;
            return Ok(dest_path);
        }

        let bytes = self.download_receipt(trip_uuid, cookies).await?;

        if let Err(e) = self.cache.put_receipt(trip_uuid, &bytes).await {
            tracing::warn!(trip_uuid, error = %e, "Failed to cache receipt, continuing");
        }

        tokio::fs::write(&dest_path, &bytes).await?;
        Ok(dest_path)
    }

    /// Merge the given receipt files, in the caller-supplied order, into
    /// `dest_dir/{output_name}` (default `merged_receipt.pdf`).
    ///
    /// Any unreadable input aborts the whole merge; no partial output is
    /// written.
    pub async fn merge_receipts(
        &self,
        paths: &[PathBuf],
        dest_dir: &Path,
        output_name: Option<&str>,
    ) -> Result<PathBuf> {
        if paths.is_empty() {
            return Err(AppError::MergeInput(
                "no input documents to merge".to_string(),
            ));
        }

        let mut merged = merge_documents(paths)?;

        tokio::fs::create_dir_all(dest_dir).await?;
        let output_path = dest_dir.join(output_name.unwrap_or(DEFAULT_MERGED_NAME));
        merged
            .save(&output_path)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to save merged PDF: {}", e)))?;

        tracing::info!(
            inputs = paths.len(),
            output = %output_path.display(),
            "Merged receipts"
        );
        Ok(output_path)
    }

    /// Download receipts for the selected trips and merge them, returning
    /// the merged path plus the individual per-trip paths.
    pub async fn download_and_merge(
        &self,
        trip_uuids: &[String],
        cookies: &CookieJar,
        dest_dir: &Path,
    ) -> Result<(PathBuf, Vec<PathBuf>)> {
        let mut paths = Vec::with_capacity(trip_uuids.len());
        for uuid in trip_uuids {
            paths.push(self.fetch_receipt(uuid, cookies, dest_dir).await?);
        }

        let merged = self.merge_receipts(&paths, dest_dir, None).await?;
        Ok((merged, paths))
    }

    async fn download_receipt(&self, trip_uuid: &str, cookies: &CookieJar) -> Result<Vec<u8>> {
        let url = format!(
            "{}/trips/{}/receipt?contentType=PDF",
            self.base_url, trip_uuid
        );

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::COOKIE, cookies.header_value())
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Receipt download failed: {}", e)))?;

        let status = response.status();
        if matches!(status.as_u16(), 401 | 403 | 404) {
            return Err(AppError::Authentication(format!(
                "Receipt for {} rejected with HTTP {}. {}",
                trip_uuid,
                status.as_u16(),
                AppError::AUTH_HINT
            )));
        }
        if !status.is_success() {
            return Err(AppError::Network(format!(
                "Receipt download for {} failed with HTTP {}",
                trip_uuid, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Network(format!("Receipt download failed: {}", e)))?;
        tracing::debug!(trip_uuid, bytes = bytes.len(), "Downloaded receipt");
        Ok(bytes.to_vec())
    }
}

/// Combine the pages of the input documents, in order, into one document.
fn merge_documents(paths: &[PathBuf]) -> Result<Document> {
    // Object id allocation must not collide across inputs, so each loaded
    // document is renumbered into its own id range first.
    let mut next_id = 1u32;
    let mut all_objects: Vec<(ObjectId, Object)> = Vec::new();
    let mut all_pages: Vec<(ObjectId, Dictionary)> = Vec::new();

    for path in paths {
        let mut doc = Document::load(path).map_err(|e| {
            AppError::MergeInput(format!("{}: {}", path.display(), e))
        })?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        // get_pages() is keyed by page number, so iteration preserves the
        // document's own page order.
        for (_, page_id) in doc.get_pages() {
            let mut page = doc
                .get_object(page_id)
                .and_then(Object::as_dict)
                .map(Dictionary::clone)
                .map_err(|e| {
                    AppError::MergeInput(format!("{}: bad page object: {}", path.display(), e))
                })?;
            copy_inherited_keys(&doc, &mut page);
            all_pages.push((page_id, page));
        }

        all_objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    merged.max_id = next_id;
    let pages_id = merged.new_object_id();

    for (object_id, object) in all_objects {
        match dict_type(&object) {
            // The page tree and catalog are rebuilt below; pages are
            // reinserted with their new parent.
            Some(b"Catalog") | Some(b"Pages") | Some(b"Page") => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let mut kids: Vec<Object> = Vec::with_capacity(all_pages.len());
    for (page_id, mut page) in all_pages {
        page.set("Parent", pages_id);
        kids.push(Object::Reference(page_id));
        merged.objects.insert(page_id, Object::Dictionary(page));
    }

    let count = kids.len() as i64;
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);
    merged.renumber_objects();
    merged.compress();

    Ok(merged)
}

/// Dictionary `/Type` name of an object, if it has one.
fn dict_type(object: &Object) -> Option<&[u8]> {
    object
        .as_dict()
        .ok()
        .and_then(|d| d.get(b"Type").ok())
        .and_then(|t| t.as_name().ok())
}

/// Copy inheritable page-tree attributes down onto a page dictionary by
/// walking its `Parent` chain in the source document.
fn copy_inherited_keys(doc: &Document, page: &mut Dictionary) {
    for key in INHERITABLE_PAGE_KEYS {
        if page.has(key) {
            continue;
        }
        if let Some(value) = lookup_inherited(doc, page, key) {
            page.set(key.to_vec(), value);
        }
    }
}

fn lookup_inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent_ref = page.get(b"Parent").ok()?.as_reference().ok()?;
    // Bounded walk guards against malformed circular parent chains.
    let mut seen: BTreeMap<ObjectId, ()> = BTreeMap::new();
    loop {
        if seen.insert(parent_ref, ()).is_some() {
            return None;
        }
        let parent = doc.get_object(parent_ref).ok()?.as_dict().ok()?;
        if let Ok(value) = parent.get(key) {
            return Some(value.clone());
        }
        parent_ref = parent.get(b"Parent").ok()?.as_reference().ok()?;
    }
}
