//! Resolves logical asset names against the versioned build manifest.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Logical path (`/css/style.css`) to versioned output path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AssetManifest(HashMap<String, String>);

impl AssetManifest
{
        pub fn from_json(source: &str) -> anyhow::Result<Self>
        {
                Ok(serde_json::from_str(source)?)
        }

        pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self>
        {
                let path = path.as_ref();

                let source = std::fs::read_to_string(path)
                        .with_context(|| format!("reading manifest {}", path.display()))?;

                Self::from_json(&source).with_context(|| format!("parsing manifest {}", path.display()))
        }

        /// The versioned path, or the name with a leading slash when the
        /// manifest has no entry for it.
        pub fn resolve(
                &self,
                name: &str,
        ) -> String
        {
                let key = format!("/{}", name.trim_start_matches('/'));

                match self.0.get(&key)
                {
                        Some(versioned) => versioned.clone(),
                        None => key,
                }
        }

        pub fn len(&self) -> usize
        {
                self.0.len()
        }

        pub fn is_empty(&self) -> bool
        {
                self.0.is_empty()
        }
}

/// Looks `name` up in the manifest at `manifest_path`.
///
/// A manifest that is missing or unreadable leaves `name` untouched.
pub fn asset_name(
        name: &str,
        manifest_path: impl AsRef<Path>,
) -> String
{
        match AssetManifest::from_file(manifest_path)
        {
                Ok(manifest) => manifest.resolve(name),
                Err(e) =>
                {
                        log::debug!("asset_name: {e:#}");
                        name.to_string()
                }
        }
}

#[cfg(test)]
mod tests
{
        use std::path::PathBuf;

        use super::*;

        fn write_manifest(
                file: &str,
                contents: &str,
        ) -> PathBuf
        {
                let path = std::env::temp_dir().join(format!("orbis-{}-{file}", std::process::id()));
                std::fs::write(&path, contents).unwrap();
                path
        }

        #[test]
        fn resolves_versioned_name()
        {
                let path = write_manifest("versioned.json", r#"{ "/css/style.css": "/css/style.abc123.css" }"#);

                assert_eq!(asset_name("css/style.css", &path), "/css/style.abc123.css");
                assert_eq!(asset_name("/css/style.css", &path), "/css/style.abc123.css");

                std::fs::remove_file(path).unwrap();
        }

        #[test]
        fn unknown_name_is_normalized()
        {
                let path = write_manifest("unknown.json", r#"{ "/css/style.css": "/css/style.abc123.css" }"#);

                assert_eq!(asset_name("js/app.js", &path), "/js/app.js");

                std::fs::remove_file(path).unwrap();
        }

        #[test]
        fn missing_manifest_returns_input()
        {
                let path = std::env::temp_dir().join("orbis-no-such-manifest.json");

                assert_eq!(asset_name("css/style.css", &path), "css/style.css");
        }

        #[test]
        fn malformed_manifest_returns_input()
        {
                let path = write_manifest("malformed.json", "not json");

                assert_eq!(asset_name("images/earth-day.jpg", &path), "images/earth-day.jpg");

                std::fs::remove_file(path).unwrap();
        }

        #[test]
        fn parses_manifest_map()
        {
                let manifest = AssetManifest::from_json(r#"{ "/a.js": "/a.1.js", "/b.js": "/b.2.js" }"#).unwrap();

                assert_eq!(manifest.len(), 2);
                assert_eq!(manifest.resolve("b.js"), "/b.2.js");
        }
}
