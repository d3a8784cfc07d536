use gloo::net::http::{Request, Response};
use grid_waldo_core as game;
use grid_waldo_protocol as protocol;
use serde::{Serialize, de::DeserializeOwned};

use crate::settings::ServiceSettings;

type ServiceResult<T> = Result<T, game::ServiceError>;

fn unreachable(err: gloo::net::Error) -> game::ServiceError {
    game::ServiceError::Unreachable(err.to_string())
}

fn malformed(err: gloo::net::Error) -> game::ServiceError {
    game::ServiceError::Malformed(err.to_string())
}

fn check_status(response: Response) -> ServiceResult<Response> {
    if response.ok() {
        Ok(response)
    } else {
        Err(game::ServiceError::Status(response.status()))
    }
}

/// Text encoder of the CLIP model server.
#[derive(Clone, Debug)]
pub(crate) struct ClipEmbedder {
    url: String,
    token: String,
}

impl game::Embedder for ClipEmbedder {
    async fn embed_text(&self, text: &str) -> ServiceResult<game::Embedding> {
        let response = Request::post(&protocol::clip_text_url(&self.url))
            .header("Content-Type", "text/plain")
            .header("Authorization", &format!("Bearer {}", self.token))
            .body(text)
            .map_err(unreachable)?
            .send()
            .await
            .map_err(unreachable)?;

        let values: protocol::TextEmbedding =
            check_status(response)?.json().await.map_err(malformed)?;
        log::trace!("embedded {text:?} into {} dimensions", values.len());
        Ok(values.into())
    }
}

/// Image database reached through its RPC endpoints.
#[derive(Clone, Debug)]
pub(crate) struct Database {
    url: String,
    key: String,
}

impl Database {
    async fn rpc<A, R>(&self, function: &str, args: &A) -> ServiceResult<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = Request::post(&protocol::rpc_url(&self.url, function))
            .header("apikey", &self.key)
            .header("Authorization", &format!("Bearer {}", self.key))
            .json(args)
            .map_err(malformed)?
            .send()
            .await
            .map_err(unreachable)?;

        check_status(response)?.json().await.map_err(malformed)
    }

    fn image_url(&self, path: &str) -> String {
        protocol::public_object_url(&self.url, protocol::IMAGE_BUCKET, path)
    }
}

impl game::Matcher for Database {
    async fn match_embedding(
        &self,
        embedding: &game::Embedding,
        candidate_ids: &[String],
    ) -> ServiceResult<Vec<game::SimilarityMatch>> {
        let args = protocol::MatchInContextArgs {
            query_embedding: embedding.as_slice(),
            id_list: candidate_ids,
        };
        let rows: Vec<protocol::MatchRow> = self.rpc(protocol::MATCH_IN_CONTEXT_RPC, &args).await?;
        log::debug!("{} matches among {} candidates", rows.len(), candidate_ids.len());

        Ok(rows
            .into_iter()
            .map(|row| game::SimilarityMatch::new(row.id, row.similarity))
            .collect())
    }
}

impl game::ImageSource for Database {
    async fn fetch_random_images(&self) -> ServiceResult<Vec<game::ImageRecord>> {
        let rows: Vec<protocol::RandomImageRow> =
            self.rpc(protocol::RANDOM_IMAGES_RPC, &protocol::NoArgs {}).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let display_url = self.image_url(&row.path);
                game::ImageRecord::new(row.path, display_url)
            })
            .collect())
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Services {
    pub embedder: ClipEmbedder,
    pub database: Database,
}

impl Services {
    pub(crate) fn new(settings: &ServiceSettings) -> Self {
        Self {
            embedder: ClipEmbedder {
                url: settings.clip_url.clone(),
                token: settings.clip_token.clone(),
            },
            database: Database {
                url: settings.database_url.clone(),
                key: settings.database_key.clone(),
            },
        }
    }
}

/// Stand-in images shown until the database answers.
pub(crate) fn placeholder_images() -> impl Iterator<Item = game::ImageRecord> {
    (0..game::GRID_CELLS).map(|i| {
        game::ImageRecord::new(
            format!("placeholder-{i}"),
            format!("https://picsum.photos/seed/LifeIsGood-{i}/230/180"),
        )
    })
}
