//! Named keypoint skeleton presets.
//!
//! A keypoints annotation refers to its preset by id through
//! `skeletonType`. Unknown ids are allowed; consumers fall back to the
//! point names stored on the annotation itself.

/// Broad grouping used when listing presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkeletonCategory {
    Human,
    Hand,
    Face,
    Animal,
}

/// Ordered keypoint names plus 0-based connectivity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkeletonPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub category: SkeletonCategory,
    pub keypoints: &'static [&'static str],
    pub connections: &'static [(usize, usize)],
}

impl SkeletonPreset {
    /// Connections renumbered from 1, as COCO `skeleton` expects.
    pub fn one_based_connections(&self) -> Vec<[usize; 2]> {
        self.connections.iter().map(|&(a, b)| [a + 1, b + 1]).collect()
    }

    /// Position of a keypoint name in this preset.
    pub fn index_of(&self, keypoint: &str) -> Option<usize> {
        self.keypoints.iter().position(|k| *k == keypoint)
    }
}

/// Preset used when a keypoints project does not name one.
pub const DEFAULT_PRESET_ID: &str = "coco-17";

pub static COCO_17: SkeletonPreset = SkeletonPreset {
    id: "coco-17",
    name: "COCO 17 Keypoints",
    category: SkeletonCategory::Human,
    keypoints: &[
        "nose",
        "left_eye",
        "right_eye",
        "left_ear",
        "right_ear",
        "left_shoulder",
        "right_shoulder",
        "left_elbow",
        "right_elbow",
        "left_wrist",
        "right_wrist",
        "left_hip",
        "right_hip",
        "left_knee",
        "right_knee",
        "left_ankle",
        "right_ankle",
    ],
    connections: &[
        // head
        (0, 1),
        (0, 2),
        (1, 3),
        (2, 4),
        // arms
        (5, 6),
        (5, 7),
        (7, 9),
        (6, 8),
        (8, 10),
        // torso
        (5, 11),
        (6, 12),
        (11, 12),
        // legs
        (11, 13),
        (13, 15),
        (12, 14),
        (14, 16),
    ],
};

pub static MEDIAPIPE_POSE_33: SkeletonPreset = SkeletonPreset {
    id: "mediapipe-pose-33",
    name: "MediaPipe Pose (33 points)",
    category: SkeletonCategory::Human,
    keypoints: &[
        "nose",
        "left_eye_inner",
        "left_eye",
        "left_eye_outer",
        "right_eye_inner",
        "right_eye",
        "right_eye_outer",
        "left_ear",
        "right_ear",
        "mouth_left",
        "mouth_right",
        "left_shoulder",
        "right_shoulder",
        "left_elbow",
        "right_elbow",
        "left_wrist",
        "right_wrist",
        "left_pinky",
        "right_pinky",
        "left_index",
        "right_index",
        "left_thumb",
        "right_thumb",
        "left_hip",
        "right_hip",
        "left_knee",
        "right_knee",
        "left_ankle",
        "right_ankle",
        "left_heel",
        "right_heel",
        "left_foot_index",
        "right_foot_index",
    ],
    connections: &[
        (0, 1),
        (1, 2),
        (2, 3),
        (0, 4),
        (4, 5),
        (5, 6),
        (2, 7),
        (5, 8),
        (0, 9),
        (0, 10),
        (11, 12),
        (11, 13),
        (13, 15),
        (15, 17),
        (15, 19),
        (15, 21),
        (12, 14),
        (14, 16),
        (16, 18),
        (16, 20),
        (16, 22),
        (11, 23),
        (12, 24),
        (23, 24),
        (23, 25),
        (25, 27),
        (27, 29),
        (27, 31),
        (24, 26),
        (26, 28),
        (28, 30),
        (28, 32),
    ],
};

pub static MEDIAPIPE_HAND_21: SkeletonPreset = SkeletonPreset {
    id: "mediapipe-hand-21",
    name: "MediaPipe Hand (21 points)",
    category: SkeletonCategory::Hand,
    keypoints: &[
        "wrist",
        "thumb_cmc",
        "thumb_mcp",
        "thumb_ip",
        "thumb_tip",
        "index_mcp",
        "index_pip",
        "index_dip",
        "index_tip",
        "middle_mcp",
        "middle_pip",
        "middle_dip",
        "middle_tip",
        "ring_mcp",
        "ring_pip",
        "ring_dip",
        "ring_tip",
        "pinky_mcp",
        "pinky_pip",
        "pinky_dip",
        "pinky_tip",
    ],
    connections: &[
        // palm
        (0, 1),
        (0, 5),
        (0, 9),
        (0, 13),
        (0, 17),
        // fingers
        (1, 2),
        (2, 3),
        (3, 4),
        (5, 6),
        (6, 7),
        (7, 8),
        (9, 10),
        (10, 11),
        (11, 12),
        (13, 14),
        (14, 15),
        (15, 16),
        (17, 18),
        (18, 19),
        (19, 20),
        // palm base
        (5, 9),
        (9, 13),
        (13, 17),
    ],
};

pub static MEDIAPIPE_FACE_BASIC: SkeletonPreset = SkeletonPreset {
    id: "mediapipe-face-basic",
    name: "Face Basic (10 points)",
    category: SkeletonCategory::Face,
    keypoints: &[
        "left_eye",
        "right_eye",
        "nose_tip",
        "mouth_left",
        "mouth_right",
        "left_ear",
        "right_ear",
        "chin",
        "forehead_left",
        "forehead_right",
    ],
    connections: &[
        (0, 1),
        (0, 2),
        (1, 2),
        (2, 7),
        (3, 4),
        (0, 5),
        (1, 6),
        (0, 8),
        (1, 9),
    ],
};

pub static ANIMAL_QUADRUPED: SkeletonPreset = SkeletonPreset {
    id: "animal-quadruped",
    name: "Animal Quadruped",
    category: SkeletonCategory::Animal,
    keypoints: &[
        "nose",
        "left_eye",
        "right_eye",
        "left_ear",
        "right_ear",
        "neck",
        "back",
        "tail_base",
        "tail_tip",
        "left_front_shoulder",
        "left_front_elbow",
        "left_front_paw",
        "right_front_shoulder",
        "right_front_elbow",
        "right_front_paw",
        "left_back_hip",
        "left_back_knee",
        "left_back_paw",
        "right_back_hip",
        "right_back_knee",
        "right_back_paw",
    ],
    connections: &[
        (0, 1),
        (0, 2),
        (1, 3),
        (2, 4),
        (5, 6),
        (6, 7),
        (7, 8),
        (5, 9),
        (9, 10),
        (10, 11),
        (5, 12),
        (12, 13),
        (13, 14),
        (7, 15),
        (15, 16),
        (16, 17),
        (7, 18),
        (18, 19),
        (19, 20),
    ],
};

/// Every built-in preset.
pub fn all_presets() -> [&'static SkeletonPreset; 5] {
    [
        &COCO_17,
        &MEDIAPIPE_POSE_33,
        &MEDIAPIPE_HAND_21,
        &MEDIAPIPE_FACE_BASIC,
        &ANIMAL_QUADRUPED,
    ]
}

/// Looks up a preset by id.
pub fn preset(id: &str) -> Option<&'static SkeletonPreset> {
    all_presets().into_iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connections_reference_existing_keypoints() {
        for preset in all_presets() {
            for &(a, b) in preset.connections {
                assert!(a < preset.keypoints.len(), "{}: {a}", preset.id);
                assert!(b < preset.keypoints.len(), "{}: {b}", preset.id);
            }
        }
    }

    #[test]
    fn preset_sizes() {
        assert_eq!(COCO_17.keypoints.len(), 17);
        assert_eq!(MEDIAPIPE_POSE_33.keypoints.len(), 33);
        assert_eq!(MEDIAPIPE_HAND_21.keypoints.len(), 21);
        assert_eq!(MEDIAPIPE_FACE_BASIC.keypoints.len(), 10);
        assert_eq!(ANIMAL_QUADRUPED.keypoints.len(), 21);
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(preset("coco-17").map(|p| p.id), Some("coco-17"));
        assert!(preset("custom-thing").is_none());
        assert_eq!(COCO_17.index_of("left_wrist"), Some(9));
    }

    #[test]
    fn one_based_skeleton() {
        assert_eq!(COCO_17.one_based_connections()[0], [1, 2]);
    }
}
