// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/properties.rs - IoU 与 NMS 性质测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

mod common;

use proptest::prelude::*;

use common::{Anchor, tensor};
use shanan_detect::{
  Candidate, Configuration, DetectionPipeline, NormalizedRect,
  config::MIN_BOX_EXTENT,
  labels::ClassNames,
  model::{NonMaxSuppressor, nms::suppress_greedy},
};

fn rect() -> impl Strategy<Value = NormalizedRect> {
  (0.0f32..0.9, 0.0f32..0.9, 0.01f32..0.5, 0.01f32..0.5)
    .prop_map(|(x, y, w, h)| NormalizedRect::new(x, y, w, h))
}

fn candidate() -> impl Strategy<Value = Candidate> {
  (0usize..3, 0.0f32..1.0, rect()).prop_map(|(class_index, confidence, bbox)| Candidate {
    class_index,
    confidence,
    bbox,
  })
}

fn anchor() -> impl Strategy<Value = Anchor> {
  (
    0.0f32..640.0,
    0.0f32..640.0,
    0.0f32..320.0,
    0.0f32..320.0,
    0usize..4,
    0.0f32..1.0,
  )
    .prop_map(|(cx, cy, w, h, class, score)| Anchor {
      bbox: [cx, cy, w, h],
      class,
      score,
    })
}

proptest! {
  #[test]
  fn iou_is_bounded_and_symmetric(a in rect(), b in rect()) {
    let ab = a.iou(&b);
    let ba = b.iou(&a);
    prop_assert!((0.0..=1.0 + 1e-6).contains(&ab));
    prop_assert!((ab - ba).abs() < 1e-6);
  }

  #[test]
  fn kept_same_class_pairs_respect_threshold(
    candidates in prop::collection::vec(candidate(), 0..40),
    threshold in 0.05f32..0.95,
  ) {
    let kept = suppress_greedy(candidates, threshold);
    for (i, a) in kept.iter().enumerate() {
      for b in &kept[i + 1..] {
        if a.class_index == b.class_index {
          prop_assert!(a.bbox.iou(&b.bbox) <= threshold);
        }
      }
    }
    for pair in kept.windows(2) {
      prop_assert!(pair[0].confidence >= pair[1].confidence);
    }
  }

  #[test]
  fn suppression_is_idempotent(
    candidates in prop::collection::vec(candidate(), 0..40),
    threshold in 0.05f32..0.95,
  ) {
    let labels = ClassNames::new(["a", "b", "c"]);
    let once = NonMaxSuppressor.suppress(candidates, threshold, &labels);
    let twice = NonMaxSuppressor.suppress_detections(once.clone(), threshold);
    prop_assert_eq!(once, twice);
  }

  #[test]
  fn decoded_detections_respect_filters(
    anchors in prop::collection::vec(anchor(), 0..64),
    confidence in 0.05f32..0.95,
  ) {
    let total = anchors.len().max(1);
    let tensor = tensor(4, total, &anchors);
    let config = Configuration::default()
      .with_class_names(ClassNames::new(["a", "b", "c", "d"]))
      .with_confidence_threshold(confidence)
      .with_max_candidates(64);
    let detections = DetectionPipeline::new().run(&tensor.into(), &config);

    for d in &detections {
      prop_assert!(d.confidence() >= config.confidence_threshold());
      let b = d.bbox();
      for v in [b.x, b.y, b.width, b.height] {
        prop_assert!((0.0..=1.0).contains(&v));
      }
      prop_assert!(b.width >= MIN_BOX_EXTENT && b.height >= MIN_BOX_EXTENT);
    }
  }
}
