use crate::clipping::context::MaskBinding;
use crate::clipping::manager::{ClippingManager, MaskPass};
use crate::scene::model::Model;

/// Backend-agnostic pass list for one model draw.
///
/// All shared-surface mask passes come first, so every mask is complete before anything
/// samples it. In high precision mode each clipped draw or composite is instead preceded by
/// its own mask pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePlan {
    pub passes: Vec<Pass>,
}

impl FramePlan {
    pub fn mask_passes(&self) -> impl Iterator<Item = &MaskPass> + '_ {
        self.passes.iter().filter_map(|p| match p {
            Pass::Mask(m) => Some(m),
            _ => None,
        })
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawMeshPass> + '_ {
        self.passes.iter().filter_map(|p| match p {
            Pass::DrawMesh(d) => Some(d),
            _ => None,
        })
    }
}

/// A single pass in a [`FramePlan`].
#[derive(Clone, Debug, PartialEq)]
pub enum Pass {
    Mask(MaskPass),
    BeginOffscreen(OffscreenPass),
    DrawMesh(DrawMeshPass),
    CompositeOffscreen(CompositePass),
}

/// Start rendering into an offscreen; the target is cleared first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffscreenPass {
    pub offscreen: usize,
    /// Offscreen this one composites into; `None` for the model target.
    pub parent: Option<usize>,
}

/// Draw one drawable into the current target, optionally sampling a mask.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawMeshPass {
    pub drawable: usize,
    /// Offscreen being drawn into; `None` for the model target.
    pub target: Option<usize>,
    pub mask: Option<MaskBinding>,
}

/// Blend a finished offscreen into its parent target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositePass {
    pub offscreen: usize,
    pub target: Option<usize>,
    pub mask: Option<MaskBinding>,
}

/// Inputs [`compile_frame`] reads besides the model.
#[derive(Clone, Copy, Debug)]
pub struct PlanInputs<'a> {
    pub drawable_clipping: Option<&'a ClippingManager>,
    pub offscreen_clipping: Option<&'a ClippingManager>,
    /// Enclosing offscreen per offscreen, see [`crate::resolve_parent_offscreens`].
    pub parent_offscreens: &'a [Option<usize>],
    pub high_precision: bool,
}

/// Orders the visible drawables by `render_order` and wraps them in offscreen begin/composite
/// pairs following the part hierarchy.
///
/// An offscreen opens when its first descendant draws and is composited once the next draw
/// no longer belongs to it. Descendants split by a foreign draw produce a second segment.
pub fn compile_frame(model: &Model, inputs: PlanInputs<'_>) -> FramePlan {
    let mut passes = Vec::new();

    if !inputs.high_precision {
        for mgr in [inputs.drawable_clipping, inputs.offscreen_clipping]
            .into_iter()
            .flatten()
        {
            passes.extend(mgr.build_mask_passes(model).into_iter().map(Pass::Mask));
        }
    }

    let mut order = model
        .drawables
        .iter()
        .enumerate()
        .filter(|(_, d)| d.is_visible)
        .map(|(i, d)| (d.render_order, i))
        .collect::<Vec<_>>();
    order.sort_unstable();

    let mut open: Vec<usize> = Vec::new();
    for (_, drawable) in order {
        let target = model.drawables[drawable]
            .parent_part
            .and_then(|part| enclosing_offscreen(model, part));
        let chain = offscreen_chain(target, inputs.parent_offscreens);

        while let Some(&top) = open.last() {
            if chain.contains(&top) {
                break;
            }
            open.pop();
            close_offscreen(model, &inputs, &mut passes, top, open.last().copied());
        }
        for &o in chain.iter().rev() {
            if !open.contains(&o) {
                passes.push(Pass::BeginOffscreen(OffscreenPass {
                    offscreen: o,
                    parent: open.last().copied(),
                }));
                open.push(o);
            }
        }

        let mask = clipped_binding(model, &inputs, inputs.drawable_clipping, drawable, &mut passes);
        passes.push(Pass::DrawMesh(DrawMeshPass {
            drawable,
            target: open.last().copied(),
            mask,
        }));
    }

    while let Some(top) = open.pop() {
        close_offscreen(model, &inputs, &mut passes, top, open.last().copied());
    }

    FramePlan { passes }
}

fn close_offscreen(
    model: &Model,
    inputs: &PlanInputs<'_>,
    passes: &mut Vec<Pass>,
    offscreen: usize,
    target: Option<usize>,
) {
    let mask = clipped_binding(model, inputs, inputs.offscreen_clipping, offscreen, passes);
    passes.push(Pass::CompositeOffscreen(CompositePass {
        offscreen,
        target,
        mask,
    }));
}

/// Mask binding for `object`, emitting its exclusive mask pass first in high precision mode.
fn clipped_binding(
    model: &Model,
    inputs: &PlanInputs<'_>,
    mgr: Option<&ClippingManager>,
    object: usize,
    passes: &mut Vec<Pass>,
) -> Option<MaskBinding> {
    let mgr = mgr?;
    let ctx = mgr.context_for(object)?;
    let binding = mgr.mask_binding(ctx.id())?;
    if inputs.high_precision
        && let Some(pass) = mgr.mask_pass(model, ctx.id(), true)
    {
        passes.push(Pass::Mask(pass));
    }
    Some(binding)
}

/// Offscreen owned by `part` or its nearest ancestor.
fn enclosing_offscreen(model: &Model, part: usize) -> Option<usize> {
    std::iter::once(part)
        .chain(model.ancestors(part))
        .find_map(|p| model.offscreen_owned_by(p))
}

/// `target` followed by its enclosing offscreens, innermost first.
fn offscreen_chain(target: Option<usize>, parents: &[Option<usize>]) -> Vec<usize> {
    let mut chain = Vec::new();
    let mut cur = target;
    while let Some(o) = cur {
        if chain.contains(&o) || chain.len() > parents.len() {
            break;
        }
        chain.push(o);
        cur = parents.get(o).copied().flatten();
    }
    chain
}

#[cfg(test)]
#[path = "../../tests/unit/render/plan.rs"]
mod tests;
