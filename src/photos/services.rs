use anyhow::Context;
use bytes::Bytes;
use uuid::Uuid;

use crate::state::AppState;
use crate::store::CatRecord;

const PRESIGN_TTL_SECS: u64 = 30 * 60;

/// Upload a new profile photo and point the cat record at it. The previous
/// photo object, if any, is removed best-effort after the new one is live.
pub async fn replace_profile_photo(
    st: &AppState,
    cat: &mut CatRecord,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<String> {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    let key = format!("cats/{}/photo-{}.{}", cat.id, Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    if let Some(old) = cat.photo_key.take() {
        if let Err(e) = st.storage.delete_object(&old).await {
            tracing::warn!(error = %e, key = %old, "failed to delete replaced profile photo");
        }
    }

    cat.photo_key = Some(key.clone());
    st.store
        .save_cat(cat)
        .await
        .context("save cat after photo upload")?;
    Ok(key)
}

pub async fn presign_profile_photo(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, PRESIGN_TTL_SECS)
        .await
        .with_context(|| format!("presign url for {}", key))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
