//! Imagenet training records, as written by the inception data preparation
//! scripts.
use convnet_core::internal::*;
use ndarray::Array3;

use crate::example::{FeatureKind, FeatureSpec, FeatureValue, parse_single_example};

pub const IMAGE_ENCODED: &str = "image/encoded";
pub const CLASS_LABEL: &str = "image/class/label";
pub const CLASS_TEXT: &str = "image/class/text";
pub const HEIGHT: &str = "image/height";
pub const WIDTH: &str = "image/width";
pub const BBOX_XMIN: &str = "image/object/bbox/xmin";
pub const BBOX_YMIN: &str = "image/object/bbox/ymin";
pub const BBOX_XMAX: &str = "image/object/bbox/xmax";
pub const BBOX_YMAX: &str = "image/object/bbox/ymax";

fn schema() -> [(&'static str, FeatureSpec); 9] {
    [
        (IMAGE_ENCODED, FeatureSpec::fixed_bytes(b"")),
        (CLASS_LABEL, FeatureSpec::fixed_int64(-1)),
        (CLASS_TEXT, FeatureSpec::fixed_bytes(b"")),
        (HEIGHT, FeatureSpec::fixed_int64(-1)),
        (WIDTH, FeatureSpec::fixed_int64(-1)),
        (BBOX_XMIN, FeatureSpec::var_len(FeatureKind::Float)),
        (BBOX_YMIN, FeatureSpec::var_len(FeatureKind::Float)),
        (BBOX_XMAX, FeatureSpec::var_len(FeatureKind::Float)),
        (BBOX_YMAX, FeatureSpec::var_len(FeatureKind::Float)),
    ]
}

/// Normalized box coordinates, in TensorFlow's `(ymin, xmin, ymax, xmax)` order.
#[derive(Debug, Clone, Copy, PartialEq, Default, new)]
pub struct BoundingBox {
    pub ymin: f32,
    pub xmin: f32,
    pub ymax: f32,
    pub xmax: f32,
}

impl BoundingBox {
    pub fn as_array(&self) -> [f32; 4] {
        [self.ymin, self.xmin, self.ymax, self.xmax]
    }

    fn is_normalized(&self) -> bool {
        self.as_array().iter().all(|c| (0.0..1.0).contains(c))
    }
}

/// One decoded training example.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    image: Vec<u8>,
    label: i32,
    text: Vec<u8>,
    boxes: Vec<BoundingBox>,
    height: i64,
    width: i64,
}

impl Record {
    /// Encoded (JPEG) image bytes.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn label(&self) -> i32 {
        self.label
    }

    /// Human readable class name.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }

    pub fn text_bytes(&self) -> &[u8] {
        &self.text
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    /// Boxes as a `[1, num_boxes, 4]` array, one `(ymin, xmin, ymax, xmax)`
    /// row per box.
    pub fn bbox_tensor(&self) -> Array3<f32> {
        Array3::from_shape_fn((1, self.boxes.len(), 4), |(_, b, c)| self.boxes[b].as_array()[c])
    }
}

fn malformed(msg: String) -> convnet_core::anyhow::Error {
    anyhow!(NetError::MalformedRecord(msg))
}

fn take(features: &mut HashMap<String, FeatureValue>, name: &str) -> NetResult<FeatureValue> {
    features.remove(name).ok_or_else(|| malformed(format!("feature {name:?} not parsed")))
}

fn scalar_bytes(features: &mut HashMap<String, FeatureValue>, name: &str) -> NetResult<Vec<u8>> {
    match take(features, name)? {
        FeatureValue::Bytes(mut v) if v.len() == 1 => Ok(v.remove(0)),
        other => Err(malformed(format!("feature {name:?}: expected one bytes value, got {other:?}"))),
    }
}

fn scalar_int64(features: &mut HashMap<String, FeatureValue>, name: &str) -> NetResult<i64> {
    match take(features, name)? {
        FeatureValue::Int64(v) if v.len() == 1 => Ok(v[0]),
        other => Err(malformed(format!("feature {name:?}: expected one int64 value, got {other:?}"))),
    }
}

fn floats(features: &mut HashMap<String, FeatureValue>, name: &str) -> NetResult<Vec<f32>> {
    match take(features, name)? {
        FeatureValue::Float(v) => Ok(v),
        other => Err(malformed(format!("feature {name:?}: expected floats, got {other:?}"))),
    }
}

/// Decode one serialized `Example` into a [`Record`].
pub fn decode(bytes: &[u8]) -> NetResult<Record> {
    let mut features = parse_single_example(bytes, &schema())?;
    let image = scalar_bytes(&mut features, IMAGE_ENCODED)?;
    let label = scalar_int64(&mut features, CLASS_LABEL)?;
    let label = i32::try_from(label)
        .map_err(|_| malformed(format!("class label {label} does not fit in 32 bits")))?;
    let text = scalar_bytes(&mut features, CLASS_TEXT)?;
    let height = scalar_int64(&mut features, HEIGHT)?;
    let width = scalar_int64(&mut features, WIDTH)?;

    let xmin = floats(&mut features, BBOX_XMIN)?;
    let ymin = floats(&mut features, BBOX_YMIN)?;
    let xmax = floats(&mut features, BBOX_XMAX)?;
    let ymax = floats(&mut features, BBOX_YMAX)?;
    let n = xmin.len();
    if ymin.len() != n || xmax.len() != n || ymax.len() != n {
        return Err(malformed(format!(
            "bounding box coordinates disagree on box count: xmin {}, ymin {}, xmax {}, ymax {}",
            n,
            ymin.len(),
            xmax.len(),
            ymax.len()
        )));
    }
    let boxes: Vec<BoundingBox> =
        (0..n).map(|i| BoundingBox::new(ymin[i], xmin[i], ymax[i], xmax[i])).collect();
    if let Some(b) = boxes.iter().find(|b| !b.is_normalized()) {
        warn!("Record with label {label} has a box outside of [0, 1): {b:?}");
    }
    debug!("Decoded record: label {label}, {}x{}, {} bytes, {} box(es)", height, width, image.len(), n);
    Ok(Record { image, label, text, boxes, height, width })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfpb::{Example, example};

    fn base() -> Example {
        example()
            .bytes(IMAGE_ENCODED, &b"\xff\xd8\xff\xe0"[..])
            .int64(CLASS_LABEL, 615)
            .bytes(CLASS_TEXT, "knee pad")
            .int64(HEIGHT, 375)
            .int64(WIDTH, 500)
    }

    #[test]
    fn boxes_in_order() {
        crate::setup_test_logger();
        let bytes = base()
            .floats(BBOX_XMIN, &[0.1, 0.3])
            .floats(BBOX_YMIN, &[0.2, 0.4])
            .floats(BBOX_XMAX, &[0.9, 0.5])
            .floats(BBOX_YMAX, &[0.6, 0.7])
            .write_to_bytes();
        let record = decode(&bytes).unwrap();
        assert_eq!(
            record.boxes(),
            &[BoundingBox::new(0.2, 0.1, 0.6, 0.9), BoundingBox::new(0.4, 0.3, 0.7, 0.5)]
        );
        let tensor = record.bbox_tensor();
        assert_eq!(tensor.shape(), &[1, 2, 4]);
        assert_eq!(tensor.as_slice().unwrap(), &[0.2, 0.1, 0.6, 0.9, 0.4, 0.3, 0.7, 0.5]);
    }

    #[test]
    fn scalars() {
        let record = decode(&base().write_to_bytes()).unwrap();
        assert_eq!(record.image(), b"\xff\xd8\xff\xe0");
        assert_eq!(record.label(), 615);
        assert_eq!(record.text(), "knee pad");
        assert_eq!((record.height(), record.width()), (375, 500));
        assert!(record.boxes().is_empty());
        assert_eq!(record.bbox_tensor().shape(), &[1, 0, 4]);
    }

    #[test]
    fn missing_image() {
        let bytes = example()
            .int64(CLASS_LABEL, 1)
            .bytes(CLASS_TEXT, "tench")
            .int64(HEIGHT, 1)
            .int64(WIDTH, 1)
            .write_to_bytes();
        let e = decode(&bytes).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::MalformedRecord(_))));
    }

    #[test]
    fn box_count_mismatch() {
        let bytes = base()
            .floats(BBOX_XMIN, &[0.1, 0.3])
            .floats(BBOX_YMIN, &[0.2])
            .floats(BBOX_XMAX, &[0.9, 0.5])
            .floats(BBOX_YMAX, &[0.6, 0.7])
            .write_to_bytes();
        let e = decode(&bytes).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::MalformedRecord(_))));
    }

    #[test]
    fn label_out_of_range() {
        let bytes = base().int64(CLASS_LABEL, 1 << 40).write_to_bytes();
        let e = decode(&bytes).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::MalformedRecord(_))));
    }

    #[test]
    fn non_utf8_text_is_kept() {
        let bytes = base().bytes(CLASS_TEXT, &b"caf\xe9"[..]).write_to_bytes();
        let record = decode(&bytes).unwrap();
        assert_eq!(record.text_bytes(), b"caf\xe9");
        assert_eq!(record.text(), "caf\u{fffd}");
    }
}
