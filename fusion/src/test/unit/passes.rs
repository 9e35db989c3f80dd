use graft_ir::{AttrValue, ComputeGraph, GraphBuilder, Node};

use crate::config::PipelineConfig;
use crate::error::{Error, InvalidPatternSnafu, Result};
use crate::passes::*;
use crate::pattern::{MatchResult, Pattern};
use crate::provenance::ATTR_FUSION_PASS;
use crate::test::helpers::*;

struct BlockFusion {
    admit: bool,
}

impl PatternFusionPass for BlockFusion {
    fn name(&self) -> &str {
        "block_fusion"
    }

    fn patterns(&self) -> Vec<Pattern> {
        vec![abs_exp_relu_pattern()]
    }

    fn meet_requirements(&self, _graph: &ComputeGraph, _matched: &MatchResult) -> bool {
        self.admit
    }

    fn replacement(&self, _graph: &ComputeGraph, _matched: &MatchResult) -> Result<ComputeGraph> {
        Ok(fused_replacement("AbsExpRelu", 1, 2))
    }
}

/// `Abs` feeding both the fused `Add` and an external path back into it.
struct AbsAdd;

impl PatternFusionPass for AbsAdd {
    fn name(&self) -> &str {
        "abs_add"
    }

    fn patterns(&self) -> Vec<Pattern> {
        let mut b = GraphBuilder::new("abs_add");
        let x = b.data(0);
        let y = b.data(1);
        let abs = b.op("Abs", &[x]);
        let add = b.op("Add", &[abs, y]);
        vec![Pattern::new(b.build(&[abs, add]).unwrap())]
    }

    fn replacement(&self, _graph: &ComputeGraph, _matched: &MatchResult) -> Result<ComputeGraph> {
        Ok(fused_replacement("AbsAdd", 2, 2))
    }
}

/// Replacement arity never fits the boundary.
struct BadArity;

impl PatternFusionPass for BadArity {
    fn name(&self) -> &str {
        "bad_arity"
    }

    fn patterns(&self) -> Vec<Pattern> {
        vec![chain_pattern(&["Abs"])]
    }

    fn replacement(&self, _graph: &ComputeGraph, _matched: &MatchResult) -> Result<ComputeGraph> {
        Ok(fused_replacement("Fabs", 3, 1))
    }
}

struct FailingReplacement;

impl PatternFusionPass for FailingReplacement {
    fn name(&self) -> &str {
        "failing"
    }

    fn patterns(&self) -> Vec<Pattern> {
        vec![chain_pattern(&["Abs"])]
    }

    fn replacement(&self, _graph: &ComputeGraph, matched: &MatchResult) -> Result<ComputeGraph> {
        InvalidPatternSnafu { pattern: matched.pattern().name(), reason: "no replacement" }.fail()
    }
}

struct SquareDecompose;

impl DecomposePass for SquareDecompose {
    fn name(&self) -> &str {
        "square_decompose"
    }

    fn op_types(&self) -> &[&str] {
        &["Square"]
    }

    fn replacement(&self, _node: &Node) -> Result<ComputeGraph> {
        let mut b = GraphBuilder::new("square");
        let x = b.data(0);
        let mul = b.op("Mul", &[x, x]);
        b.net_output(&[mul]);
        Ok(b.build(&[]).unwrap())
    }
}

/// Claims a change on every run.
struct NeverSettles;

impl FusionBasePass for NeverSettles {
    fn name(&self) -> &str {
        "never_settles"
    }

    fn run(&mut self, _graph: &mut ComputeGraph, _ctx: &mut PassContext) -> Result<PassStatus> {
        Ok(PassStatus::Changed)
    }
}

fn block_fusion() -> Box<dyn FusionBasePass> {
    Box::new(PatternFusion::new(BlockFusion { admit: true }))
}

#[test]
fn test_pass_status_merge() {
    assert_eq!(PassStatus::NotChanged.merge(PassStatus::NotChanged), PassStatus::NotChanged);
    assert_eq!(PassStatus::NotChanged.merge(PassStatus::Changed), PassStatus::Changed);
    assert_eq!(PassStatus::Changed.merge(PassStatus::NotChanged), PassStatus::Changed);
    assert_eq!(PassStatus::Changed.to_string(), "Changed");
}

#[test]
fn test_pattern_fusion_reaches_fixpoint() {
    let mut graph = abs_exp_relu_blocks(4);
    let mut pass = block_fusion();
    let mut ctx = PassContext::new();

    assert_eq!(pass.run(&mut graph, &mut ctx).unwrap(), PassStatus::Changed);
    assert_eq!(count_op(&graph, "AbsExpRelu"), 4);
    assert_eq!(count_op(&graph, "Abs"), 0);
    for node in graph.nodes().filter(|n| n.op_type() == "AbsExpRelu") {
        assert_eq!(node.attr(ATTR_FUSION_PASS).and_then(AttrValue::as_str), Some("block_fusion"));
    }

    let settled = graph.dump();
    assert_eq!(pass.run(&mut graph, &mut ctx).unwrap(), PassStatus::NotChanged);
    assert_eq!(graph.dump(), settled);
    assert!(ctx.notes().is_empty());
}

#[test]
fn test_rejected_matches_are_not_rewritten() {
    let mut graph = abs_exp_relu_blocks(3);
    let before = graph.dump();
    let mut pass = PatternFusion::new(BlockFusion { admit: false });

    assert_eq!(pass.run(&mut graph, &mut PassContext::new()).unwrap(), PassStatus::NotChanged);
    assert_eq!(graph.dump(), before);
}

#[test]
fn test_cyclic_fusion_is_skipped_with_note() {
    let mut b = GraphBuilder::new("diamond");
    let x = b.data(0);
    let abs = b.op("Abs", &[x]);
    let neg = b.op("Neg", &[abs]);
    let add = b.op("Add", &[abs, neg]);
    let mut graph = b.build(&[add]).unwrap();
    let before = graph.dump();

    let mut ctx = PassContext::new();
    let status = PatternFusion::new(AbsAdd).run(&mut graph, &mut ctx).unwrap();

    assert_eq!(status, PassStatus::NotChanged);
    assert_eq!(graph.dump(), before);
    assert_eq!(ctx.notes().len(), 1);
    assert!(ctx.notes()[0].contains("abs_add"), "{:?}", ctx.notes());
    assert!(ctx.notes()[0].contains("cycle"), "{:?}", ctx.notes());
}

#[test]
fn test_failed_rewrite_restores_graph() {
    let mut graph = abs_exp_relu_blocks(2);
    let before = graph.dump();

    let err = PatternFusion::new(BadArity).run(&mut graph, &mut PassContext::new()).unwrap_err();
    assert!(
        matches!(&err, Error::Pass { pass, source } if pass == "bad_arity"
            && matches!(source.as_ref(), Error::InputCountMismatch { replacement: 3, boundary: 1 })),
        "{err}"
    );
    assert_eq!(graph.dump(), before);
}

#[test]
fn test_replacement_hook_errors_name_the_pass() {
    let mut graph = abs_exp_relu_blocks(1);
    let before = graph.dump();

    let err = PatternFusion::new(FailingReplacement).run(&mut graph, &mut PassContext::new()).unwrap_err();
    assert!(matches!(&err, Error::Pass { pass, .. } if pass == "failing"), "{err}");
    assert!(err.to_string().contains("failing"), "{err}");
    assert_eq!(graph.dump(), before);
}

#[test]
fn test_decompose_rewrites_connected_nodes() {
    let mut b = GraphBuilder::new("squares");
    let x = b.data(0);
    let square = b.op("Square", &[x]);
    let exp = b.op("Exp", &[square]);
    let mut graph = b.build(&[exp]).unwrap();
    let lonely = graph.add_node("Square", "lonely", 1, 1);

    let mut pass = Decompose::new(SquareDecompose);
    let mut ctx = PassContext::new();
    assert_eq!(pass.run(&mut graph, &mut ctx).unwrap(), PassStatus::Changed);

    assert_eq!(count_op(&graph, "Mul"), 1);
    assert_eq!(count_op(&graph, "Square"), 1);
    assert!(graph.contains(lonely));
    let mul = graph.nodes().find(|n| n.op_type() == "Mul").unwrap();
    assert_eq!(mul.inputs(), &[Some(x), Some(x)]);
    assert_eq!(mul.attr(ATTR_FUSION_PASS).and_then(AttrValue::as_str), Some("square_decompose"));
    assert_eq!(graph.producer(graft_ir::InAnchor::new(exp.node, 0)).map(|io| io.node), Some(mul.id()));

    assert_eq!(pass.run(&mut graph, &mut ctx).unwrap(), PassStatus::NotChanged);
}

fn registry() -> PassRegistry {
    let mut registry = PassRegistry::new();
    registry.register_fusion_pass("block_fusion", PassStage::AfterInferShape, block_fusion);
    registry.register_fusion_pass("square_decompose", PassStage::BeforeInferShape, || -> Box<dyn FusionBasePass> {
        Box::new(Decompose::new(SquareDecompose))
    });
    registry
}

#[test]
fn test_run_stage_runs_registered_passes() {
    let registry = registry();
    let config = PipelineConfig::default();
    let mut graph = abs_exp_relu_blocks(3);
    let mut ctx = PassContext::new();

    let status = run_stage(&registry, PassStage::BeforeInferShape, &mut graph, &mut ctx, &config).unwrap();
    assert_eq!(status, PassStatus::NotChanged);

    let status = run_stage(&registry, PassStage::AfterInferShape, &mut graph, &mut ctx, &config).unwrap();
    assert_eq!(status, PassStatus::Changed);
    assert_eq!(count_op(&graph, "AbsExpRelu"), 3);

    let status = run_stage(&registry, PassStage::AfterInferShape, &mut graph, &mut ctx, &config).unwrap();
    assert_eq!(status, PassStatus::NotChanged);
}

#[test]
fn test_run_stage_skips_disabled_passes() {
    let registry = registry();
    let config = PipelineConfig::builder().disabled_passes(["block_fusion".to_string()]).build();
    let mut graph = abs_exp_relu_blocks(2);
    let before = graph.dump();

    let status =
        run_stage(&registry, PassStage::AfterInferShape, &mut graph, &mut PassContext::new(), &config).unwrap();
    assert_eq!(status, PassStatus::NotChanged);
    assert_eq!(graph.dump(), before);
}

#[test]
fn test_run_stage_reports_missing_fixpoint() {
    let mut registry = PassRegistry::new();
    registry.register_fusion_pass("never_settles", PassStage::AfterBuiltinFusion, || -> Box<dyn FusionBasePass> {
        Box::new(NeverSettles)
    });
    let config = PipelineConfig::builder().max_iterations(3).build();
    let mut graph = abs_exp_relu_blocks(1);

    let err = run_stage(&registry, PassStage::AfterBuiltinFusion, &mut graph, &mut PassContext::new(), &config)
        .unwrap_err();
    assert!(matches!(&err, Error::NoFixpoint { pass, iterations: 3 } if pass == "never_settles"), "{err}");
}
