use rstest::{fixture, rstest};
use std::sync::Arc;
use xquery_builtins::consts::{FNS, XMLDB_NS};
use xquery_builtins::memory::MemoryCollectionStore;
use xquery_builtins::simple_node::{doc, elem};
use xquery_builtins::{
    ArgExpr, CollectionStore, Error, ErrorCode, ErrorKind, ExpandedName, Focus, Literal,
    QueryContext, QueryContextBuilder, SimpleNode, XdmItem as I, XdmSequence,
};

type N = SimpleNode;

struct Db {
    a1: N,
    a2: N,
    sub: N,
    other: N,
    store: Arc<MemoryCollectionStore<N>>,
}

fn document(root: &str) -> N {
    doc().child(elem(root)).build()
}

#[fixture]
fn db() -> Db {
    let (a1, a2, sub, other) = (document("a1"), document("a2"), document("sub"), document("b"));
    let store = MemoryCollectionStore::new()
        .with_document("/db/a", a1.clone())
        .with_document("/db/a", a2.clone())
        .with_document("/db/a/sub", sub.clone())
        .with_document("/db/ab", other.clone());
    Db {
        a1,
        a2,
        sub,
        other,
        store: Arc::new(store),
    }
}

impl Db {
    fn query(&self) -> QueryContext<N> {
        QueryContextBuilder::new()
            .with_collection_store(self.store.clone())
            .build()
            .unwrap()
    }
}

fn call(q: &QueryContext<N>, name: ExpandedName, paths: &[&str]) -> Result<XdmSequence<N>, Error> {
    let paths: Vec<I<N>> = paths.iter().map(|p| I::from(*p)).collect();
    let args: Vec<ArgExpr<N>> = vec![Arc::new(Literal(paths))];
    q.bind(&name, 1)?.evaluate(q, &Focus::empty(), &args)
}

fn nodes(items: &[&N]) -> Vec<I<N>> {
    items.iter().map(|n| I::Node((*n).clone())).collect()
}

#[rstest]
fn xcollection_excludes_subcollections(db: Db) {
    let q = db.query();
    let out = call(&q, ExpandedName::ns(XMLDB_NS, "xcollection"), &["/db/a"]).unwrap();
    assert_eq!(out, nodes(&[&db.a1, &db.a2]));
}

#[rstest]
fn collection_includes_subcollections(db: Db) {
    let q = db.query();
    let out = call(&q, ExpandedName::ns(FNS, "collection"), &["/db/a"]).unwrap();
    assert_eq!(out, nodes(&[&db.a1, &db.a2, &db.sub]));
    // a sibling sharing the name prefix is not a subcollection
    assert!(!out.contains(&I::Node(db.other.clone())));
}

#[rstest]
fn trailing_slash_names_the_same_collection(db: Db) {
    let q = db.query();
    let out = call(&q, ExpandedName::ns(XMLDB_NS, "xcollection"), &["/db/a/"]).unwrap();
    assert_eq!(out, nodes(&[&db.a1, &db.a2]));
}

#[rstest]
fn documents_reached_twice_are_returned_once(db: Db) {
    let q = db.query();
    let out = call(
        &q,
        ExpandedName::ns(FNS, "collection"),
        &["/db/a/sub", "/db/a"],
    )
    .unwrap();
    assert_eq!(out, nodes(&[&db.sub, &db.a1, &db.a2]));
}

#[rstest]
fn collection_with_only_subcollections_is_empty_for_xcollection() {
    let child = document("c");
    let store = MemoryCollectionStore::new().with_document("/db/x/y", child.clone());
    let q = QueryContextBuilder::<N>::new()
        .with_collection_store(Arc::new(store))
        .build()
        .unwrap();
    assert!(call(&q, ExpandedName::ns(XMLDB_NS, "xcollection"), &["/db/x"]).unwrap().is_empty());
    assert_eq!(
        call(&q, ExpandedName::ns(FNS, "collection"), &["/db/x"]).unwrap(),
        nodes(&[&child])
    );
}

#[rstest]
#[case("collection")]
#[case("xcollection")]
fn unknown_collection_propagates_store_error(db: Db, #[case] local: &str) {
    let q = db.query();
    let ns = if local == "collection" { FNS } else { XMLDB_NS };
    let err = call(&q, ExpandedName::ns(ns, local), &["/db/missing"]).unwrap_err();
    let direct = db.store.list_documents("/db/missing", false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Collaborator);
    assert_eq!(err.code, direct.code);
    assert_eq!(err.message, direct.message);
}

#[rstest]
fn missing_store_is_a_collaborator_error() {
    let q = QueryContextBuilder::<N>::new().build().unwrap();
    let err = call(&q, ExpandedName::ns(FNS, "collection"), &["/db"]).unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::FODC0002);
}

#[rstest]
fn path_must_be_given(db: Db) {
    let q = db.query();
    let err = call(&q, ExpandedName::ns(XMLDB_NS, "xcollection"), &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Signature);
}
