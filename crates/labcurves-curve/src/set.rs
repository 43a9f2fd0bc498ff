//! The four channel curves of a session.

use crate::{Curve, CurveChannel};
use std::ops::{Index, IndexMut};

/// One curve per [`CurveChannel`] plus one backup slot per channel.
///
/// Backups let a caller try an edit and roll it back without keeping its
/// own copy of the curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSet {
    curves: [Curve; 4],
    backups: [Option<Curve>; 4],
}

impl Default for CurveSet {
    fn default() -> Self {
        Self {
            curves: CurveChannel::ALL.map(Curve::new),
            backups: [None, None, None, None],
        }
    }
}

impl CurveSet {
    /// All four null curves, no backups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Curve of `channel`.
    #[inline]
    pub fn get(&self, channel: CurveChannel) -> &Curve {
        &self.curves[channel.index()]
    }

    /// Mutable curve of `channel`.
    #[inline]
    pub fn get_mut(&mut self, channel: CurveChannel) -> &mut Curve {
        &mut self.curves[channel.index()]
    }

    /// Replaces the curve of `channel`, returning the previous one.
    ///
    /// The new curve is retagged to `channel`.
    pub fn replace(&mut self, channel: CurveChannel, curve: Curve) -> Curve {
        let mut curve = curve;
        curve.retag(channel);
        std::mem::replace(&mut self.curves[channel.index()], curve)
    }

    /// Iterates `(channel, curve)` in L, a, b, saturation order.
    pub fn iter(&self) -> impl Iterator<Item = (CurveChannel, &Curve)> {
        CurveChannel::ALL.into_iter().zip(self.curves.iter())
    }

    /// Copies the current curve of `channel` into its backup slot.
    pub fn backup_curve(&mut self, channel: CurveChannel) {
        let i = channel.index();
        self.backups[i] = Some(self.curves[i].clone());
    }

    /// Restores the backup of `channel`.
    ///
    /// Returns `false` if no backup was taken. The backup is kept, so a
    /// curve can be restored several times.
    pub fn restore_curve(&mut self, channel: CurveChannel) -> bool {
        let i = channel.index();
        match &self.backups[i] {
            Some(backup) => {
                self.curves[i] = backup.clone();
                true
            }
            None => false,
        }
    }

    /// Backup of `channel`, if any.
    pub fn backup(&self, channel: CurveChannel) -> Option<&Curve> {
        self.backups[channel.index()].as_ref()
    }

    /// Resets every curve to its null curve and drops the backups.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Index<CurveChannel> for CurveSet {
    type Output = Curve;

    fn index(&self, channel: CurveChannel) -> &Curve {
        self.get(channel)
    }
}

impl IndexMut<CurveChannel> for CurveSet {
    fn index_mut(&mut self, channel: CurveChannel) -> &mut Curve {
        self.get_mut(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Anchor, Interpolation, SATURATION_NEUTRAL};

    #[test]
    fn default_holds_null_curves() {
        let set = CurveSet::new();
        for (channel, curve) in set.iter() {
            assert_eq!(curve.channel(), channel);
        }
        assert_eq!(set[CurveChannel::Lightness].lookup(1234), 1234);
        assert_eq!(set[CurveChannel::Saturation].lookup(1234), SATURATION_NEUTRAL);
    }

    #[test]
    fn backup_and_restore() {
        let mut set = CurveSet::new();
        assert!(!set.restore_curve(CurveChannel::ChromaA));

        set.backup_curve(CurveChannel::ChromaA);
        set[CurveChannel::ChromaA]
            .set_anchors(vec![Anchor::new(0.0, 0.1), Anchor::new(1.0, 0.9)])
            .unwrap();
        assert_ne!(set[CurveChannel::ChromaA], Curve::new(CurveChannel::ChromaA));

        assert!(set.restore_curve(CurveChannel::ChromaA));
        assert_eq!(set[CurveChannel::ChromaA], Curve::new(CurveChannel::ChromaA));
        assert!(set.backup(CurveChannel::ChromaA).is_some());
        assert!(set.backup(CurveChannel::ChromaB).is_none());
    }

    #[test]
    fn replace_retags_channel() {
        let mut set = CurveSet::new();
        let curve = Curve::from_anchors(
            CurveChannel::Lightness,
            vec![Anchor::new(0.0, 0.0), Anchor::new(1.0, 0.5)],
            Interpolation::Linear,
        )
        .unwrap();
        let old = set.replace(CurveChannel::ChromaB, curve);
        assert_eq!(old.channel(), CurveChannel::ChromaB);
        assert_eq!(set[CurveChannel::ChromaB].channel(), CurveChannel::ChromaB);
        assert_eq!(set[CurveChannel::ChromaB].lookup(0xffff), 0x8000);
    }
}
