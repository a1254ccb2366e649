#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sf_docs::adapters::SurrealStore;
use sf_docs::config::StoreConfig;
use sf_docs::ports::{EmbeddingGenerator, FetchedPage, PageFetcher};
use sf_docs::{Result, SfDocsError};

pub const DIMENSION: usize = 256;

/// Bag-of-words embedder: each lowercase word lands in a hashed bucket.
/// Texts sharing vocabulary score high under cosine similarity.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
        {
            let bucket = blake3::hash(word.to_lowercase().as_bytes()).as_bytes()[0] as usize % DIMENSION;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        } else {
            v[0] = 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingGenerator for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Serves canned pages; anything else is a 404.
#[derive(Default)]
pub struct StaticFetcher {
    pages: Mutex<HashMap<String, String>>,
}

impl StaticFetcher {
    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.set_page(url, html);
        self
    }

    pub fn set_page(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let body = self.pages.lock().unwrap().get(url).cloned();
        match body {
            Some(body) => Ok(FetchedPage {
                url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: body.into_bytes(),
            }),
            None => Err(SfDocsError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

pub fn page(title: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(
        "<html><head><title>{title}</title></head><body><nav>Home Docs Search</nav><main><h1>{title}</h1>{body}</main></body></html>"
    )
}

pub async fn memory_store() -> SurrealStore {
    let config = StoreConfig {
        endpoint: "mem://".to_string(),
        ..StoreConfig::default()
    };
    SurrealStore::connect(&config).await.unwrap()
}
