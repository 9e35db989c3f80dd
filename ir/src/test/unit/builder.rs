use crate::error::Error;
use crate::{ATTR_INDEX, AttrValue, GraphBuilder, NET_OUTPUT, TensorValue};

#[test]
fn test_data_nodes_carry_index() {
    let mut b = GraphBuilder::new("inputs");
    let x1 = b.data(1);
    let x0 = b.data(0);
    let graph = b.build(&[]).unwrap();

    assert_eq!(graph.data_nodes(), vec![(0, x0.node), (1, x1.node)]);
    assert_eq!(graph.node(x1.node).unwrap().attr(ATTR_INDEX), Some(&AttrValue::Int(1)));
}

#[test]
fn test_duplicate_data_index_is_deferred_error() {
    let mut b = GraphBuilder::new("dup");
    b.data(0);
    b.data(0);

    let err = b.build(&[]).unwrap_err();
    assert!(matches!(err, Error::DuplicateDataIndex { index: 0, .. }), "{err}");
}

#[test]
fn test_foreign_anchor_is_deferred_error() {
    let mut other = GraphBuilder::new("other");
    let foreign = other.data(0);

    let mut b = GraphBuilder::new("main");
    b.op("Abs", &[foreign]);
    let err = b.build(&[]).unwrap_err();
    assert!(matches!(err, Error::ForeignAnchor { .. }), "{err}");
}

#[test]
fn test_constants_and_multi_output() {
    let mut b = GraphBuilder::new("split");
    let c = b.constant(TensorValue::scalar_f32(1.5));
    let any = b.any_constant();
    let parts = b.op_multi("Split", &[c], 3);
    let graph = b.build(&parts).unwrap();

    assert_eq!(parts.len(), 3);
    assert!(graph.node(c.node).unwrap().constant_value().is_some());
    assert!(graph.node(any.node).unwrap().is_constant());
    assert!(graph.node(any.node).unwrap().constant_value().is_none());
    assert_eq!(graph.outputs().len(), 3);
}

#[test]
fn test_net_output_declares_outputs() {
    let mut b = GraphBuilder::new("net");
    let x = b.data(0);
    let relu = b.op("Relu", &[x]);
    let net = b.net_output(&[relu]);
    let graph = b.build(&[]).unwrap();

    assert_eq!(graph.outputs(), &[relu]);
    assert_eq!(graph.node(net).unwrap().op_type(), NET_OUTPUT);
    assert!(graph.node(net).unwrap().is_net_output());
}

#[test]
fn test_auto_names_are_unique_per_type() {
    let mut b = GraphBuilder::new("names");
    let x = b.data(0);
    let a = b.op("Abs", &[x]);
    let a2 = b.op("Abs", &[a]);
    let graph = b.build(&[a2]).unwrap();

    assert_eq!(graph.node(a.node).unwrap().name(), "abs_0");
    assert_eq!(graph.node(a2.node).unwrap().name(), "abs_1");
}

#[test]
fn test_ir_attrs_are_tracked_separately() {
    let mut b = GraphBuilder::new("attrs");
    let x = b.data(0);
    let conv = b.op("Conv2D", &[x]);
    b.set_ir_attr(conv.node, "strides", vec![1i64, 1]);
    b.set_attr(conv.node, "_stream", "s0");
    let graph = b.build(&[conv]).unwrap();

    let node = graph.node(conv.node).unwrap();
    let ir: Vec<_> = node.ir_attrs().map(|(k, _)| k).collect();
    assert_eq!(ir, vec!["strides"]);
    assert_eq!(node.attrs().len(), 2);
}
