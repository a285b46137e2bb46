//! Whole-operation transform built from a per-component transform.
//!
//! Types whose operations are lists of independently addressed components
//! (flat text, JSON) only describe how one component moves past another.
//! [`ComponentOt`] lifts that into `transform_x` and `transform` over full
//! operations, which needs O(n·m) component transforms.

use crate::error::OtResult;
use crate::side::Side;

pub trait ComponentOt {
    type Component: Clone;

    /// Reject components the type cannot represent meaningfully.
    fn check_valid_op(op: &[Self::Component]) -> OtResult<()>;

    /// Push `c` onto `dest`, merging it with the last component when possible.
    fn append(dest: &mut Vec<Self::Component>, c: Self::Component);

    /// Transform `c` so it applies after `other`, appending the result
    /// (zero, one or several components) to `dest`.
    fn transform_component(
        dest: &mut Vec<Self::Component>,
        c: &Self::Component,
        other: &Self::Component,
        side: Side,
    ) -> OtResult<()>;

    /// Transform two concurrent operations against each other.
    ///
    /// Returns `(left', right')` where `left'` applies after `right` and
    /// `right'` applies after `left`.
    fn transform_x(
        left: &[Self::Component],
        right: &[Self::Component],
    ) -> OtResult<(Vec<Self::Component>, Vec<Self::Component>)> {
        Self::check_valid_op(left)?;
        Self::check_valid_op(right)?;

        let mut left_op: Vec<Self::Component> = left.to_vec();
        let mut new_right: Vec<Self::Component> = Vec::new();

        for right_component in right {
            let mut rc = Some(right_component.clone());
            let mut new_left: Vec<Self::Component> = Vec::new();

            let mut k = 0;
            while k < left_op.len() {
                let Some(current) = rc.take() else { break };
                let mut next_c: Vec<Self::Component> = Vec::new();
                Self::transform_component(&mut new_left, &left_op[k], &current, Side::Left)?;
                Self::transform_component(&mut next_c, &current, &left_op[k], Side::Right)?;
                k += 1;

                match next_c.len() {
                    1 => rc = next_c.pop(),
                    0 => {
                        for l in &left_op[k..] {
                            Self::append(&mut new_left, l.clone());
                        }
                        break;
                    }
                    _ => {
                        let (l_, r_) = Self::transform_x(&left_op[k..], &next_c)?;
                        for l in l_ {
                            Self::append(&mut new_left, l);
                        }
                        for r in r_ {
                            Self::append(&mut new_right, r);
                        }
                        break;
                    }
                }
            }

            if let Some(rc) = rc {
                Self::append(&mut new_right, rc);
            }
            left_op = new_left;
        }

        Ok((left_op, new_right))
    }

    /// Transform `op` by the concurrent `other`.
    fn transform(
        op: &[Self::Component],
        other: &[Self::Component],
        side: Side,
    ) -> OtResult<Vec<Self::Component>> {
        if other.is_empty() {
            return Ok(op.to_vec());
        }
        if let ([c], [other_c]) = (op, other) {
            Self::check_valid_op(op)?;
            Self::check_valid_op(other)?;
            let mut dest = Vec::new();
            Self::transform_component(&mut dest, c, other_c, side)?;
            return Ok(dest);
        }
        match side {
            Side::Left => Ok(Self::transform_x(op, other)?.0),
            Side::Right => Ok(Self::transform_x(other, op)?.1),
        }
    }
}
