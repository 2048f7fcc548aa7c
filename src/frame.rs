//! The per-channel, per-tick action value.
//!
//! Ported from the tagged `struct frame_t` in
//! `lorinterface/frame.h`/`lorinterface/minify.c` of the original C
//! implementation, replacing the packed C union with a proper Rust enum.

/// One channel action scheduled for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frame {
    /// Nothing scheduled at this tick.
    #[default]
    Empty,
    SetBrightness {
        level: u8,
    },
    Fade {
        from: u8,
        to: u8,
        duration_half_seconds: u8,
    },
    On,
    Shimmer,
    Twinkle,
}

/// Two ways to compare frames: `Strict` never considers two fades equal
/// (re-sending a fade retriggers it on the hardware), `Value` lets fades with
/// identical payload bytes coalesce into a single mask message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualsMode {
    Strict,
    Value,
}

impl Frame {
    /// A frame is "set" iff it schedules an actual action.
    pub fn is_set(self) -> bool {
        !matches!(self, Frame::Empty)
    }

    /// Compare two frames under the given mode. See module docs for why fades
    /// are special-cased.
    pub fn equals(a: Frame, b: Frame, mode: EqualsMode) -> bool {
        match (a, b) {
            (Frame::Empty, Frame::Empty) => true,
            (Frame::Empty, _) | (_, Frame::Empty) => false,
            (Frame::SetBrightness { level: la }, Frame::SetBrightness { level: lb }) => la == lb,
            (
                Frame::Fade {
                    from: fa,
                    to: ta,
                    duration_half_seconds: da,
                },
                Frame::Fade {
                    from: fb,
                    to: tb,
                    duration_half_seconds: db,
                },
            ) => match mode {
                EqualsMode::Strict => false,
                EqualsMode::Value => fa == fb && ta == tb && da == db,
            },
            (Frame::On, Frame::On) => true,
            (Frame::Shimmer, Frame::Shimmer) => true,
            (Frame::Twinkle, Frame::Twinkle) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_equals_empty_under_both_modes() {
        assert!(Frame::equals(Frame::Empty, Frame::Empty, EqualsMode::Strict));
        assert!(Frame::equals(Frame::Empty, Frame::Empty, EqualsMode::Value));
    }

    #[test]
    fn empty_never_equals_set_frame() {
        let f = Frame::On;
        assert!(!Frame::equals(Frame::Empty, f, EqualsMode::Strict));
        assert!(!Frame::equals(f, Frame::Empty, EqualsMode::Value));
    }

    #[test]
    fn fade_never_strict_equal_even_to_itself() {
        let f = Frame::Fade {
            from: 0,
            to: 255,
            duration_half_seconds: 4,
        };
        assert!(!Frame::equals(f, f, EqualsMode::Strict));
        assert!(Frame::equals(f, f, EqualsMode::Value));
    }

    #[test]
    fn fades_with_different_payloads_are_value_unequal() {
        let a = Frame::Fade {
            from: 0,
            to: 255,
            duration_half_seconds: 4,
        };
        let b = Frame::Fade {
            from: 0,
            to: 254,
            duration_half_seconds: 4,
        };
        assert!(!Frame::equals(a, b, EqualsMode::Value));
    }

    #[test]
    fn non_fade_actions_are_reflexively_strict_equal() {
        for f in [Frame::On, Frame::Shimmer, Frame::Twinkle] {
            assert!(Frame::equals(f, f, EqualsMode::Strict));
        }
        assert!(Frame::equals(
            Frame::SetBrightness { level: 12 },
            Frame::SetBrightness { level: 12 },
            EqualsMode::Strict
        ));
    }

    #[test]
    fn is_set_false_only_for_empty() {
        assert!(!Frame::Empty.is_set());
        assert!(Frame::On.is_set());
        assert!(Frame::SetBrightness { level: 0 }.is_set());
    }
}
