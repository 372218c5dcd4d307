//! Cached front door to the collection pipeline.

use chrono::{DateTime, Utc};
use redscrape_core::cache::{RequestKey, TtlCache};
use redscrape_core::classifier::KeywordClassifier;
use redscrape_core::pipeline::{
    collect_posts, collect_thread, Collection, CollectionRequest, ListingSource, ThreadCollection,
    ThreadSource,
};
use redscrape_core::{ClassifiedComment, ClassifiedPost};
use std::time::Duration;
use tracing::debug;

type CachedThread = (ClassifiedPost, Vec<ClassifiedComment>);

/// Runs collection requests against a source, answering repeats of a
/// successful request from memory until the entry's TTL runs out. Failed
/// requests are never cached.
pub struct Harvester<S> {
    source: S,
    classifier: KeywordClassifier,
    posts: TtlCache<RequestKey, Vec<ClassifiedPost>>,
    threads: TtlCache<RequestKey, CachedThread>,
}

impl<S> Harvester<S> {
    pub fn new(source: S, classifier: KeywordClassifier, cache_ttl: Duration) -> Self {
        Self {
            source,
            classifier,
            posts: TtlCache::new(cache_ttl),
            threads: TtlCache::new(cache_ttl),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn classifier(&self) -> &KeywordClassifier {
        &self.classifier
    }

    pub fn clear_cache(&self) {
        self.posts.clear();
        self.threads.clear();
    }
}

impl<S: ListingSource> Harvester<S> {
    pub async fn posts(
        &self,
        request: &CollectionRequest,
        now: DateTime<Utc>,
    ) -> Collection<ClassifiedPost> {
        let key = RequestKey::subreddit(&request.subreddit, request.filter, request.start, request.end);
        if let Some(records) = self.posts.get(&key) {
            debug!("Serving r/{} from cache", request.subreddit);
            return Collection::ok(records, request.warnings());
        }

        let mut listing = self.source.listing(&request.subreddit);
        let collection = collect_posts(&mut listing, request, now, &self.classifier).await;
        if collection.is_ok() {
            self.posts.insert(key, collection.records.clone());
        }
        collection
    }
}

impl<S: ThreadSource> Harvester<S> {
    pub async fn thread(&self, url: &str) -> ThreadCollection {
        let key = RequestKey::thread(url);
        if let Some((post, comments)) = self.threads.get(&key) {
            debug!("Serving thread {} from cache", url);
            return ThreadCollection {
                post: Some(post),
                comments,
                error: None,
            };
        }

        let collection = collect_thread(&self.source, url, &self.classifier).await;
        if let (Some(post), None) = (&collection.post, &collection.error) {
            self.threads
                .insert(key, (post.clone(), collection.comments.clone()));
        }
        collection
    }
}
