mod common;

use common::{encode, noise};
use png::{BitDepth, ColorType as PngColor};
use rayon::prelude::*;
use zenpng_loader::{DecodeError, PngLoader};

#[test]
fn shared_loader_decodes_in_parallel() {
    let inputs: Vec<(Vec<u8>, Vec<u8>)> = (0..32u32)
        .map(|i| {
            let (w, h) = (8 + i, 3 + i % 5);
            let data = noise((w * h * 4) as usize, i + 1);
            (encode(w, h, PngColor::Rgba, BitDepth::Eight, &data), data)
        })
        .collect();
    let loader = PngLoader::new();

    inputs.par_iter().for_each(|(png, expected)| {
        let bitmap = loader.load(png).unwrap();
        assert_eq!(bitmap.as_bytes(), &expected[..]);
    });
}

#[test]
fn parallel_failures_stay_independent() {
    let good = encode(4, 4, PngColor::Grayscale, BitDepth::Eight, &noise(16, 9));
    let loader = PngLoader::new();

    let results: Vec<_> = (0..64)
        .into_par_iter()
        .map(|i| {
            if i % 2 == 0 {
                loader.load(&good)
            } else {
                loader.load(&good[..good.len() / 2])
            }
        })
        .collect();

    for (i, result) in results.iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(result.as_ref().unwrap().as_bytes().len(), 16);
        } else {
            assert!(matches!(result, Err(DecodeError::EngineError(_))), "{result:?}");
        }
    }
}
