//! Control-flow graph construction. Auxiliary to the rewrite engine: nothing
//! in `peephole` consumes it. It exists for dumping and reporting, and for
//! any future pattern that needs block-level reasoning.

use crate::ir::{self, IrKind, IrLine};

/// A single instruction as retained inside a [`CfgBlock`] — just enough to
/// render the CFG dumps, not a full copy of the IR record.
#[derive(Debug, Clone)]
pub struct CfgInstruction {
    pub mnemonic: String,
    pub operands: Vec<String>,
}

/// A maximal straight-line run of instructions, named after the label it
/// starts at or a synthesized `blockN`.
#[derive(Debug, Clone)]
pub struct CfgBlock {
    pub name: String,
    pub instructions: Vec<CfgInstruction>,
}

/// A directed edge between two blocks, referenced by name. Duplicates are
/// allowed and edges are kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default)]
pub struct Cfg {
    pub blocks: Vec<CfgBlock>,
    pub edges: Vec<CfgEdge>,
}

impl Cfg {
    pub fn block(&self, name: &str) -> Option<&CfgBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }
}

/// Segment IR into basic blocks and connect them by jump target, fallthrough,
/// and conditional-next-block edges.
pub fn build_cfg(ir: &[IrLine]) -> Cfg {
    if ir.is_empty() {
        return Cfg::default();
    }

    let mut blocks: Vec<CfgBlock> = Vec::new();
    let mut current_label: Option<String> = None;
    let mut current_instrs: Vec<CfgInstruction> = Vec::new();
    let mut synthetic_index = 0usize;

    let mut finalize = |blocks: &mut Vec<CfgBlock>,
                         label: &mut Option<String>,
                         instrs: &mut Vec<CfgInstruction>,
                         synthetic_index: &mut usize| {
        if label.is_none() && instrs.is_empty() {
            return;
        }
        let name = label.take().unwrap_or_else(|| {
            let n = format!("block{synthetic_index}");
            *synthetic_index += 1;
            n
        });
        blocks.push(CfgBlock { name, instructions: std::mem::take(instrs) });
    };

    for line in ir {
        match line.kind {
            IrKind::Label => {
                if current_label.is_some() || !current_instrs.is_empty() {
                    finalize(&mut blocks, &mut current_label, &mut current_instrs, &mut synthetic_index);
                }
                current_label = Some(line.text.clone());
            }
            IrKind::Instruction => {
                let mnemonic = line.mnemonic.clone().unwrap_or_default();
                let operands = line.operands.clone().unwrap_or_default();
                let is_boundary = line.is_jump_or_return();
                current_instrs.push(CfgInstruction { mnemonic, operands });
                if is_boundary {
                    finalize(&mut blocks, &mut current_label, &mut current_instrs, &mut synthetic_index);
                }
            }
            IrKind::Blank | IrKind::Directive | IrKind::Text => {}
        }
    }
    finalize(&mut blocks, &mut current_label, &mut current_instrs, &mut synthetic_index);

    if blocks.is_empty() {
        blocks.push(CfgBlock { name: "block0".to_string(), instructions: Vec::new() });
    }
    // Fill any still-unnamed block (shouldn't occur given `finalize`, kept
    // defensively since the source does the same "fill missing name" pass).
    for (idx, block) in blocks.iter_mut().enumerate() {
        if block.name.is_empty() {
            block.name = format!("block{idx}");
        }
    }

    let mut edges = Vec::new();
    for (idx, block) in blocks.iter().enumerate() {
        let Some(last) = block.instructions.last() else {
            if let Some(next) = blocks.get(idx + 1) {
                edges.push(CfgEdge { source: block.name.clone(), target: next.name.clone() });
            }
            continue;
        };
        if ir::is_jump_mnemonic(&last.mnemonic) {
            let target = last
                .operands
                .first()
                .map(|op| op.trim_start_matches('*').to_string())
                .filter(|op| !op.is_empty());
            if let Some(target) = target {
                if blocks.iter().any(|b| b.name == target) {
                    edges.push(CfgEdge { source: block.name.clone(), target: target.clone() });
                }
            }
            if ir::is_conditional_jump(&last.mnemonic) {
                if let Some(next) = blocks.get(idx + 1) {
                    edges.push(CfgEdge { source: block.name.clone(), target: next.name.clone() });
                }
            }
        } else if ir::is_return_mnemonic(&last.mnemonic) {
            // no edges
        } else if let Some(next) = blocks.get(idx + 1) {
            edges.push(CfgEdge { source: block.name.clone(), target: next.name.clone() });
        }
    }

    Cfg { blocks, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::build_ir;

    fn cfg_of(lines: &[&str]) -> Cfg {
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        build_cfg(&build_ir(&lines))
    }

    #[test]
    fn single_straight_line_block_with_no_label() {
        let cfg = cfg_of(&["mov rax, rbx", "add rax, 1"]);
        assert_eq!(cfg.blocks.len(), 1);
        assert_eq!(cfg.blocks[0].name, "block0");
        assert!(cfg.edges.is_empty());
    }

    #[test]
    fn splits_at_labels_and_after_jumps() {
        let cfg = cfg_of(&["a:", "jmp b", "b:", "ret"]);
        assert_eq!(cfg.blocks.len(), 2);
        assert_eq!(cfg.blocks[0].name, "a");
        assert_eq!(cfg.blocks[1].name, "b");
        assert_eq!(cfg.edges, vec![CfgEdge { source: "a".to_string(), target: "b".to_string() }]);
    }

    #[test]
    fn conditional_jump_adds_fallthrough_edge_too() {
        // Jump target `c` differs from the lexically next block `b`, so the
        // fallthrough edge and the target edge land on different blocks.
        let cfg = cfg_of(&["a:", "je c", "b:", "ret", "c:", "mov rax, rbx"]);
        assert_eq!(cfg.blocks.len(), 3);
        assert_eq!(cfg.edges.len(), 2);
        assert!(cfg.edges.contains(&CfgEdge { source: "a".to_string(), target: "c".to_string() }));
        assert!(cfg.edges.contains(&CfgEdge { source: "a".to_string(), target: "b".to_string() }));
    }

    #[test]
    fn implicit_end_falls_through_to_next_block() {
        let cfg = cfg_of(&["a:", "mov rax, rbx", "b:", "ret"]);
        assert_eq!(cfg.edges, vec![CfgEdge { source: "a".to_string(), target: "b".to_string() }]);
    }

    #[test]
    fn return_adds_no_edges() {
        let cfg = cfg_of(&["a:", "ret", "b:", "ret"]);
        assert!(cfg.edges.is_empty());
    }

    #[test]
    fn empty_ir_produces_no_blocks() {
        // Unlike an IR that is non-empty but yields zero blocks (e.g. all
        // directives), a literally empty buffer stays empty rather than
        // synthesizing a block0.
        let cfg = build_cfg(&[]);
        assert!(cfg.blocks.is_empty());
        assert!(cfg.edges.is_empty());
    }

    #[test]
    fn non_empty_ir_with_no_label_or_instruction_gets_synthetic_block0() {
        let cfg = cfg_of(&[".text", ".globl foo"]);
        assert_eq!(cfg.blocks.len(), 1);
        assert_eq!(cfg.blocks[0].name, "block0");
    }
}
