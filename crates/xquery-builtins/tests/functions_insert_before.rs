use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use xquery_builtins::consts::FNS;
use xquery_builtins::simple_node::{elem, text};
use xquery_builtins::{
    ArgExpr, ContextItem, ContextSequence, Error, ErrorCode, ErrorKind, ExpandedName, Expr,
    Focus, Literal, QueryContext, QueryContextBuilder, SimpleNode, XdmItem as I, XdmSequence,
};

type N = SimpleNode;

fn query() -> QueryContext<N> {
    QueryContextBuilder::new().build().unwrap()
}

fn ints(values: &[i64]) -> Vec<I<N>> {
    values.iter().copied().map(I::from).collect()
}

fn lit(seq: Vec<I<N>>) -> ArgExpr<N> {
    Arc::new(Literal(seq))
}

fn insert_before(
    q: &QueryContext<N>,
    focus: &Focus<'_, N>,
    args: Vec<ArgExpr<N>>,
) -> Result<XdmSequence<N>, Error> {
    q.bind(&ExpandedName::ns(FNS, "insert-before"), 3)?
        .evaluate(q, focus, &args)
}

/// Counts evaluations and fails every time; used where the position must not be read.
struct Poisoned(AtomicUsize);

impl Expr<N> for Poisoned {
    fn evaluate(
        &self,
        _query: &QueryContext<N>,
        _focus: &Focus<'_, N>,
    ) -> Result<XdmSequence<N>, Error> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(Error::from_code(ErrorCode::FOER0000, "position evaluated"))
    }
}

#[rstest]
#[case(I::from(1_i64), &[9, 1, 2, 3])]
#[case(I::from(2_i64), &[1, 9, 2, 3])]
#[case(I::from(3_i64), &[1, 2, 9, 3])]
#[case(I::from(4_i64), &[1, 2, 3, 9])]
#[case(I::from(0_i64), &[9, 1, 2, 3])]
#[case(I::from(-7_i64), &[9, 1, 2, 3])]
#[case(I::from(100_i64), &[1, 2, 3, 9])]
#[case(I::from(i64::MIN), &[9, 1, 2, 3])]
#[case(I::from(2.9_f64), &[1, 9, 2, 3])]
#[case(I::from(-0.5_f64), &[9, 1, 2, 3])]
#[case(I::from("3"), &[1, 2, 9, 3])]
#[case(I::from(1e300_f64), &[1, 2, 3, 9])]
#[case(I::from(1e19_f64), &[1, 2, 3, 9])]
#[case(I::from(-1e19_f64), &[9, 1, 2, 3])]
#[case(I::from(f64::INFINITY), &[1, 2, 3, 9])]
#[case(I::from(f64::NEG_INFINITY), &[9, 1, 2, 3])]
#[case(I::from(f64::NAN), &[9, 1, 2, 3])]
#[case(I::from("INF"), &[1, 2, 3, 9])]
fn inserts_at_clamped_position(#[case] position: I<N>, #[case] expected: &[i64]) {
    let q = query();
    let out = insert_before(
        &q,
        &Focus::empty(),
        vec![lit(ints(&[1, 2, 3])), lit(vec![position]), lit(ints(&[9]))],
    )
    .unwrap();
    assert_eq!(out, ints(expected));
}

#[rstest]
#[case(&[1, 2, 3], &[7, 8], 2)]
#[case(&[1], &[7, 8, 9], 1)]
#[case(&[1, 2], &[7], 5)]
#[case(&[1, 2], &[7], i64::MIN)]
fn result_length_is_sum_of_operands(
    #[case] target: &[i64],
    #[case] inserts: &[i64],
    #[case] pos: i64,
) {
    let q = query();
    for position in [I::from(pos), I::from(1e19_f64), I::from(-1e19_f64), I::from(f64::NAN)] {
        let out = insert_before(
            &q,
            &Focus::empty(),
            vec![lit(ints(target)), lit(vec![position]), lit(ints(inserts))],
        )
        .unwrap();
        assert_eq!(out.len(), target.len() + inserts.len());
    }
}

#[rstest]
fn empty_target_returns_inserts_without_reading_position() {
    let q = query();
    let position = Arc::new(Poisoned(AtomicUsize::new(0)));
    let out = insert_before(
        &q,
        &Focus::empty(),
        vec![lit(vec![]), position.clone() as ArgExpr<N>, lit(ints(&[4, 5]))],
    )
    .unwrap();
    assert_eq!(out, ints(&[4, 5]));
    assert_eq!(position.0.load(Ordering::SeqCst), 0);
}

#[rstest]
fn empty_inserts_return_target_without_reading_position() {
    let q = query();
    let position = Arc::new(Poisoned(AtomicUsize::new(0)));
    let out = insert_before(
        &q,
        &Focus::empty(),
        vec![lit(ints(&[1, 2])), position.clone() as ArgExpr<N>, lit(vec![])],
    )
    .unwrap();
    assert_eq!(out, ints(&[1, 2]));
    assert_eq!(position.0.load(Ordering::SeqCst), 0);
}

#[rstest]
fn position_is_read_when_both_operands_are_present() {
    let q = query();
    let position = Arc::new(Poisoned(AtomicUsize::new(0)));
    let err = insert_before(
        &q,
        &Focus::empty(),
        vec![lit(ints(&[1])), position.clone() as ArgExpr<N>, lit(ints(&[2]))],
    )
    .unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::FOER0000);
    assert_eq!(position.0.load(Ordering::SeqCst), 1);
}

#[rstest]
#[case(I::from("abc"), ErrorKind::Conversion)]
#[case(I::from("1e"), ErrorKind::Conversion)]
#[case(I::from(true), ErrorKind::Signature)]
fn rejects_unusable_positions(#[case] position: I<N>, #[case] kind: ErrorKind) {
    let q = query();
    let err = insert_before(
        &q,
        &Focus::empty(),
        vec![lit(ints(&[1])), lit(vec![position]), lit(ints(&[2]))],
    )
    .unwrap_err();
    assert_eq!(err.kind(), kind);
}

#[rstest]
fn position_sequence_of_two_is_a_type_error() {
    let q = query();
    let err = insert_before(
        &q,
        &Focus::empty(),
        vec![lit(ints(&[1])), lit(ints(&[1, 2])), lit(ints(&[2]))],
    )
    .unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::XPTY0004);
    assert!(err.message.contains("argument 2"), "{}", err.message);
}

#[rstest]
fn operands_are_evaluated_against_the_caller_focus() {
    let q = query();
    let node = elem("item").child(text("2")).build();
    let context = vec![I::from(10_i64), I::from(20_i64)];
    let item = I::Node(node.clone());
    let focus = Focus::of_sequence(&context).with_item(&item);
    // insert-before(<context sequence>, <context item>, 99): the node atomizes to "2"
    let out = insert_before(
        &q,
        &focus,
        vec![
            Arc::new(ContextSequence) as ArgExpr<N>,
            Arc::new(ContextItem),
            lit(ints(&[99])),
        ],
    )
    .unwrap();
    assert_eq!(out, ints(&[10, 99, 20]));
}

#[rstest]
fn nodes_keep_their_identity() {
    let q = query();
    let a = elem("a").build();
    let b = elem("b").build();
    let out = insert_before(
        &q,
        &Focus::empty(),
        vec![lit(vec![I::Node(a.clone())]), lit(ints(&[1])), lit(vec![I::Node(b.clone())])],
    )
    .unwrap();
    assert_eq!(out, vec![I::Node(b), I::Node(a)]);
}

#[rstest]
fn wrong_argument_count_is_rejected_at_bind() {
    let q = query();
    let err = q
        .bind(&ExpandedName::ns(FNS, "insert-before"), 2)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Signature);
    assert_eq!(err.code_enum(), ErrorCode::XPST0017);
}
