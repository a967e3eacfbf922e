//! Typed description of the per-frame pass graph.
//!
//! Both drivers (CPU and GPU) pick their read and write buffers from these
//! descriptors instead of hard-coding them: the read role from `reads`, the
//! propagation target from [`PROPAGATE_TARGET`]. [`frame_is_consistent`] is
//! evaluated at compile time so a miswired frame does not build.

use crate::field::BufferRole;

/// Where a pass sends its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutput {
    Field(BufferRole),
    Display,
}

/// Scalar and vector inputs a pass needs besides its input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformSlot {
    Resolution,
    Impulse,
    Aspect,
    Viscosity,
    Strength,
    ImpulseRadius,
    ViewProjection,
    Depth,
    LightDir,
    Shininess,
    BaseColor,
    RippleColor,
    RippleGain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassKind {
    Compute,
    Render,
}

/// One GPU program and its wiring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassDesc {
    pub label: &'static str,
    pub kind: PassKind,
    pub reads: BufferRole,
    pub writes: PassOutput,
    pub uniforms: &'static [UniformSlot],
    /// Consumes the pending impulse; it is cleared once the pass is issued.
    pub consumes_impulse: bool,
}

impl PassDesc {
    pub const fn uses(&self, slot: UniformSlot) -> bool {
        let mut i = 0;
        while i < self.uniforms.len() {
            if self.uniforms[i] as u8 == slot as u8 {
                return true;
            }
            i += 1;
        }
        false
    }
}

pub const PROPAGATE: PassDesc = PassDesc {
    label: "Wave Propagation",
    kind: PassKind::Compute,
    reads: BufferRole::Front,
    writes: PassOutput::Field(BufferRole::Back),
    uniforms: &[
        UniformSlot::Resolution,
        UniformSlot::Impulse,
        UniformSlot::Aspect,
        UniformSlot::Viscosity,
        UniformSlot::Strength,
        UniformSlot::ImpulseRadius,
    ],
    consumes_impulse: true,
};

pub const SHADE: PassDesc = PassDesc {
    label: "Surface Shading",
    kind: PassKind::Render,
    reads: BufferRole::Back,
    writes: PassOutput::Display,
    uniforms: &[
        UniformSlot::Resolution,
        UniformSlot::ViewProjection,
        UniformSlot::Depth,
        UniformSlot::LightDir,
        UniformSlot::Shininess,
        UniformSlot::BaseColor,
        UniformSlot::RippleColor,
        UniformSlot::RippleGain,
    ],
    consumes_impulse: false,
};

/// Field written by [`PROPAGATE`].
pub const PROPAGATE_TARGET: BufferRole = match PROPAGATE.writes {
    PassOutput::Field(role) => role,
    PassOutput::Display => panic!("propagation must write a height field"),
};

/// Passes in issue order. The buffer swap follows the last one.
pub const FRAME: [PassDesc; 2] = [PROPAGATE, SHADE];

const fn same_role(a: BufferRole, b: BufferRole) -> bool {
    a as u8 == b as u8
}

/// Checks the frame wiring:
/// - the first pass reads front and no pass ever writes front,
/// - every later pass reads the buffer the previous field pass wrote,
/// - exactly one pass writes the display and it comes last,
/// - exactly one pass consumes the impulse.
pub const fn frame_is_consistent(passes: &[PassDesc]) -> bool {
    if passes.is_empty() || !same_role(passes[0].reads, BufferRole::Front) {
        return false;
    }
    let mut latest = BufferRole::Front;
    let mut displays = 0;
    let mut consumers = 0;
    let mut i = 0;
    while i < passes.len() {
        let pass = &passes[i];
        if !same_role(pass.reads, latest) {
            return false;
        }
        match pass.writes {
            PassOutput::Field(BufferRole::Front) => return false,
            PassOutput::Field(role) => latest = role,
            PassOutput::Display => {
                displays += 1;
                if i + 1 != passes.len() {
                    return false;
                }
            }
        }
        if pass.consumes_impulse {
            consumers += 1;
        }
        i += 1;
    }
    displays == 1 && consumers == 1
}

const _: () = assert!(frame_is_consistent(&FRAME), "frame pass wiring is inconsistent");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_wiring() {
        assert!(frame_is_consistent(&FRAME));
        assert_eq!(PROPAGATE.writes, PassOutput::Field(SHADE.reads));
        assert_eq!(PROPAGATE_TARGET, BufferRole::Back);
        assert_ne!(PROPAGATE_TARGET, PROPAGATE.reads);
    }

    #[test]
    fn test_shading_after_swap_is_rejected() {
        let stale = PassDesc {
            reads: BufferRole::Front,
            ..SHADE
        };
        assert!(!frame_is_consistent(&[PROPAGATE, stale]));
    }

    #[test]
    fn test_writing_front_is_rejected() {
        let in_place = PassDesc {
            writes: PassOutput::Field(BufferRole::Front),
            ..PROPAGATE
        };
        assert!(!frame_is_consistent(&[in_place, SHADE]));
    }

    #[test]
    fn test_display_must_be_last_and_unique() {
        assert!(!frame_is_consistent(&[PROPAGATE]));
        assert!(!frame_is_consistent(&[PROPAGATE, SHADE, SHADE]));
        assert!(!frame_is_consistent(&[]));
    }

    #[test]
    fn test_uniform_lookup() {
        assert!(PROPAGATE.uses(UniformSlot::Impulse));
        assert!(!SHADE.uses(UniformSlot::Impulse));
        assert!(SHADE.uses(UniformSlot::ViewProjection));
    }
}
