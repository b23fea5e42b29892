use osdconv::frame::{decode_frames, GOGGLE_FRAME_LEN};
use osdconv::header::Header;
use osdconv::pipeline::{convert, ConversionRequest, ConvertOptions, TargetVariant};
use osdconv::transpose::{transpose, untranspose};
use osdconv::TimestampMode;
use proptest::prelude::*;

fn o3_input(width: u8, height: u8, deltas: &[u32]) -> Vec<u8> {
    let mut buf = vec![0u8; 40];
    buf[0x24] = width;
    buf[0x26] = height;
    let cells = width as usize * height as usize;
    for (n, d) in deltas.iter().enumerate() {
        buf.extend_from_slice(&d.to_le_bytes());
        for c in 0..cells {
            buf.extend_from_slice(&((n * cells + c) as u16).to_le_bytes());
        }
    }
    buf
}

proptest! {
    #[test]
    fn transpose_round_trips(width in 1usize..64, height in 1usize..32) {
        let cells: Vec<u16> = (0..(width * height) as u16).collect();
        let t = transpose(&cells, width, height);
        prop_assert_eq!(untranspose(&t, width, height), cells);
    }

    #[test]
    fn o3_decode_counts_and_indices(
        width  in 2u8..=60,
        height in 1u8..=22,
        deltas in prop::collection::vec(0u32..5000, 0..6),
        tail   in 0usize..8,
        fps    in 1.0f64..120.0,
    ) {
        let mut bytes = o3_input(width, height, &deltas);
        bytes.extend(std::iter::repeat(0xEEu8).take(tail));
        let header = Header::decode(&bytes, None, false).unwrap();
        let out = decode_frames(&bytes, &header, Some(fps), TimestampMode::Cumulative).unwrap();

        prop_assert_eq!(out.frames.len(), deltas.len());
        let mut sum = 0u64;
        for (f, d) in out.frames.iter().zip(&deltas) {
            sum += u64::from(*d);
            prop_assert_eq!(f.cell_count(), width as usize * height as usize);
            prop_assert_eq!(f.index, ((sum as f64 / 1000.0) * fps).floor() as u32);
        }
    }

    #[test]
    fn goggle_output_size(frames in 0usize..5, width in 1u8..=60, height in 1u8..=22) {
        let deltas = vec![40u32; frames];
        let bytes = o3_input(width, height, &deltas);
        let opts = ConvertOptions { target: TargetVariant::Goggle, fps: Some(30.0), ..ConvertOptions::default() };
        let res = convert(&ConversionRequest::new(&bytes, "p", opts)).unwrap();
        prop_assert_eq!(res.output_bytes.len(), 40 + frames * GOGGLE_FRAME_LEN);
    }
}
