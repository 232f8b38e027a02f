use super::Backend;
use crate::taps::clip_u8;

/// Pure Rust backend emulating a 128-bit vector of four `i32` lanes.
///
/// Products of "top" and "bottom" samples go into separate even/odd
/// accumulators which are summed by [Backend::merge].
pub(crate) struct Emu128;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Accum {
    even: [i32; 4],
    odd: [i32; 4],
}

impl Backend for Emu128 {
    const LANES: usize = 4;

    type Acc = Accum;
    type Pix = ([i16; 4], [i16; 4]);
    type Coef = (i16, i16);

    #[inline(always)]
    unsafe fn splat(v: i32) -> Accum {
        Accum {
            even: [v; 4],
            odd: [0; 4],
        }
    }

    #[inline(always)]
    unsafe fn coef_pair(top: i16, bottom: i16) -> Self::Coef {
        (top, bottom)
    }

    #[inline(always)]
    unsafe fn coef_single(k: i16) -> Self::Coef {
        (k, 0)
    }

    #[inline(always)]
    unsafe fn load_pair(top: *const u8, bottom: *const u8) -> Self::Pix {
        (load4(top), load4(bottom))
    }

    #[inline(always)]
    unsafe fn load_single(ptr: *const u8) -> Self::Pix {
        (load4(ptr), [0; 4])
    }

    #[inline(always)]
    unsafe fn mul_acc(mut acc: Accum, pix: Self::Pix, coef: Self::Coef) -> Accum {
        let (top, bottom) = pix;
        let (k0, k1) = (coef.0 as i32, coef.1 as i32);
        for i in 0..4 {
            acc.even[i] += top[i] as i32 * k0;
            acc.odd[i] += bottom[i] as i32 * k1;
        }
        acc
    }

    #[inline(always)]
    unsafe fn merge(acc: Accum) -> Accum {
        let mut even = acc.even;
        even.iter_mut().zip(acc.odd).for_each(|(e, o)| *e += o);
        Accum { even, odd: [0; 4] }
    }

    #[inline(always)]
    unsafe fn shift_right(acc: Accum, shift: u32) -> Accum {
        Accum {
            even: acc.even.map(|v| v >> shift),
            odd: acc.odd.map(|v| v >> shift),
        }
    }

    #[inline(always)]
    unsafe fn add(a: Accum, b: Accum) -> Accum {
        let mut even = a.even;
        let mut odd = a.odd;
        for i in 0..4 {
            even[i] += b.even[i];
            odd[i] += b.odd[i];
        }
        Accum { even, odd }
    }

    #[inline(always)]
    unsafe fn store_u8(acc: Accum, dst: *mut u8) {
        let bytes = acc.even.map(clip_u8);
        (dst as *mut [u8; 4]).write_unaligned(bytes);
    }
}

#[inline(always)]
unsafe fn load4(ptr: *const u8) -> [i16; 4] {
    let bytes = (ptr as *const [u8; 4]).read_unaligned();
    bytes.map(|b| b as i16)
}
