//! Wire format shared with the embedding server and the image database.
//!
//! The embedding server takes the attempt text as a plain-text body and
//! answers with a bare JSON array of floats. The database is reached through
//! PostgREST-style RPC endpoints taking a JSON object of named arguments and
//! answering with a JSON array of rows.

use serde::{Deserialize, Serialize};

pub const CLIP_TEXT_ROUTE: &str = "predictions/clip_text";
pub const MATCH_IN_CONTEXT_RPC: &str = "match_documents_in_context";
pub const RANDOM_IMAGES_RPC: &str = "get_random_images";
pub const IMAGE_BUCKET: &str = "images";

/// Body returned by the embedding server.
pub type TextEmbedding = Vec<f32>;

/// Arguments of [`MATCH_IN_CONTEXT_RPC`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchInContextArgs<'a> {
    pub query_embedding: &'a [f32],
    pub id_list: &'a [String],
}

/// Row returned by [`MATCH_IN_CONTEXT_RPC`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub id: String,
    pub similarity: f32,
}

/// Arguments of an RPC that takes none.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct NoArgs {}

/// Row returned by [`RANDOM_IMAGES_RPC`]; other columns are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomImageRow {
    pub path: String,
}

fn join(base: &str, tail: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), tail.trim_start_matches('/'))
}

pub fn clip_text_url(base: &str) -> String {
    join(base, CLIP_TEXT_ROUTE)
}

pub fn rpc_url(base: &str, function: &str) -> String {
    join(base, &format!("rest/v1/rpc/{function}"))
}

pub fn public_object_url(base: &str, bucket: &str, path: &str) -> String {
    join(base, &format!("storage/v1/object/public/{bucket}/{}", path.trim_start_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn urls_tolerate_trailing_slashes() {
        assert_eq!(
            clip_text_url("https://clip.test/"),
            "https://clip.test/predictions/clip_text"
        );
        assert_eq!(
            rpc_url("https://db.test", RANDOM_IMAGES_RPC),
            "https://db.test/rest/v1/rpc/get_random_images"
        );
        assert_eq!(
            public_object_url("https://db.test/", IMAGE_BUCKET, "/cats/01.jpg"),
            "https://db.test/storage/v1/object/public/images/cats/01.jpg"
        );
    }

    #[test]
    fn match_args_use_rpc_argument_names() {
        let embedding = [0.6f32, 0.8];
        let ids = ["a.jpg".to_string(), "b.jpg".to_string()];
        let args = MatchInContextArgs {
            query_embedding: &embedding,
            id_list: &ids,
        };

        assert_eq!(
            serde_json::to_value(args).unwrap(),
            json!({ "query_embedding": [0.6f32, 0.8f32], "id_list": ["a.jpg", "b.jpg"] })
        );
        assert_eq!(serde_json::to_string(&NoArgs {}).unwrap(), "{}");
    }

    #[test]
    fn rows_ignore_extra_columns() {
        let rows: Vec<RandomImageRow> =
            serde_json::from_str(r#"[{"id": 17, "path": "dogs/3.jpg", "embedding": null}]"#)
                .unwrap();
        assert_eq!(rows[0].path, "dogs/3.jpg");

        let rows: Vec<MatchRow> =
            serde_json::from_str(r#"[{"id": "dogs/3.jpg", "similarity": 0.27}]"#).unwrap();
        assert_eq!(rows[0], MatchRow { id: "dogs/3.jpg".into(), similarity: 0.27 });

        let embedding: TextEmbedding = serde_json::from_str("[0.1, -0.2]").unwrap();
        assert_eq!(embedding.len(), 2);
    }
}
