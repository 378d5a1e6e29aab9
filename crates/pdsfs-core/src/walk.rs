//! Walking the component hierarchy of one bundle version.
//!
//! The walk follows version indexes from a bundle LIDVID down through its
//! collections to their products, calling the visitor before (`post =
//! false`) and after (`post = true`) each component's children. What kind
//! of children each component has is decided here and only here.

use async_trait::async_trait;
use pdsfs_types::Lidvid;

use crate::error::{VfsError, VfsResult};
use crate::versioned::VersionedStore;

/// Role of a collection, from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Context,
    Document,
    Schema,
    /// `data_<instrument>_<suffix>`
    Data,
    /// `browse_<instrument>_<suffix>`
    Browse,
    Other,
}

impl CollectionKind {
    pub fn classify(collection_id: &str) -> Self {
        match collection_id {
            "context" => Self::Context,
            "document" => Self::Document,
            "schema" => Self::Schema,
            id if id.starts_with("data_") => Self::Data,
            id if id.starts_with("browse_") => Self::Browse,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Context => "context",
            Self::Document => "document",
            Self::Schema => "schema",
            Self::Data => "data",
            Self::Browse => "browse",
            Self::Other => "other",
        })
    }
}

/// A component reached by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Bundle(Lidvid),
    Collection(Lidvid, CollectionKind),
    Product(Lidvid),
}

impl Entity {
    pub fn lidvid(&self) -> &Lidvid {
        match self {
            Entity::Bundle(lidvid) | Entity::Collection(lidvid, _) | Entity::Product(lidvid) => lidvid,
        }
    }
}

/// Callbacks for [`walk`].
#[async_trait]
pub trait Visitor: Send {
    async fn visit(&mut self, entity: &Entity, post: bool) -> VfsResult<()>;
}

/// Walk the bundle version `bundle`, pre- and post-visiting every
/// component it pins.
pub async fn walk(store: &VersionedStore, bundle: &Lidvid, visitor: &mut dyn Visitor) -> VfsResult<()> {
    if !bundle.lid().is_bundle() {
        return Err(VfsError::NotABundle(bundle.clone()));
    }
    walk_bundle(store, bundle, visitor).await
}

async fn walk_bundle(store: &VersionedStore, bundle: &Lidvid, visitor: &mut dyn Visitor) -> VfsResult<()> {
    let entity = Entity::Bundle(bundle.clone());
    visitor.visit(&entity, false).await?;
    for collection in store.subcomponents(bundle).await? {
        let kind = CollectionKind::classify(collection.lid().last_segment());
        walk_collection(store, collection, kind, visitor).await?;
    }
    visitor.visit(&entity, true).await
}

async fn walk_collection(
    store: &VersionedStore,
    collection: Lidvid,
    kind: CollectionKind,
    visitor: &mut dyn Visitor,
) -> VfsResult<()> {
    let products = store.subcomponents(&collection).await?;
    let entity = Entity::Collection(collection, kind);
    visitor.visit(&entity, false).await?;
    for product in products {
        walk_product(store, product, visitor).await?;
    }
    visitor.visit(&entity, true).await
}

async fn walk_product(store: &VersionedStore, product: Lidvid, visitor: &mut dyn Visitor) -> VfsResult<()> {
    if !store.contains(&product).await? {
        return Err(VfsError::VersionNotFound(product));
    }
    let entity = Entity::Product(product);
    visitor.visit(&entity, false).await?;
    visitor.visit(&entity, true).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::PrimFs;

    #[derive(Default)]
    struct Trace(Vec<String>);

    #[async_trait]
    impl Visitor for Trace {
        async fn visit(&mut self, entity: &Entity, post: bool) -> VfsResult<()> {
            let marker = if post { "post" } else { "pre" };
            let label = match entity {
                Entity::Bundle(lv) => format!("bundle {}", lv.lid().last_segment()),
                Entity::Collection(lv, kind) => format!("{kind} {}", lv.lid().last_segment()),
                Entity::Product(lv) => format!("product {}", lv.lid().last_segment()),
            };
            self.0.push(format!("{marker} {label}"));
            Ok(())
        }
    }

    fn lv(s: &str) -> Lidvid {
        s.parse().unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(CollectionKind::classify("context"), CollectionKind::Context);
        assert_eq!(CollectionKind::classify("data_wfpc2_raw"), CollectionKind::Data);
        assert_eq!(CollectionKind::classify("browse_wfpc2_raw"), CollectionKind::Browse);
        assert_eq!(CollectionKind::classify("miscellaneous"), CollectionKind::Other);
    }

    #[tokio::test]
    async fn test_walk_order() {
        let store = VersionedStore::new(PrimFs::memory());
        let b = lv("urn:nasa:pds:b::1");
        store.make_lidvid_directories(&b).await.unwrap();
        store.add_subcomponent(&b, &lv("urn:nasa:pds:b:document::1")).await.unwrap();
        let data = lv("urn:nasa:pds:b:data_acs_raw::1");
        store.add_subcomponent(&b, &data).await.unwrap();
        store.add_subcomponent(&data, &lv("urn:nasa:pds:b:data_acs_raw:p1::1")).await.unwrap();

        let mut trace = Trace::default();
        walk(&store, &b, &mut trace).await.unwrap();
        assert_eq!(
            trace.0,
            [
                "pre bundle b",
                "pre data data_acs_raw",
                "pre product p1",
                "post product p1",
                "post data data_acs_raw",
                "pre document document",
                "post document document",
                "post bundle b",
            ]
        );
    }

    #[tokio::test]
    async fn test_walk_needs_bundle() {
        let store = VersionedStore::new(PrimFs::memory());
        let result = walk(&store, &lv("urn:nasa:pds:b:c::1"), &mut Trace::default()).await;
        assert!(matches!(result, Err(VfsError::NotABundle(_))));
    }
}
