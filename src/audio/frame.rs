// The smallest unit of audio; one stereo frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn zero() -> Self { // `default` with a clearer name
        Self::default()
    }

    pub fn mono(&self) -> f32 {
        (self.left + self.right) * 0.5
    }
}
