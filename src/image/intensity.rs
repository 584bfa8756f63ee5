//! Owned single-channel f64 intensity buffer in row-major layout.
//!
//! Projection images are square: `n × n` pixels where `n` is the grid pixel
//! count. Row `r` holds the samples whose first grid index equals `r`.
#[derive(Clone, Debug, PartialEq)]
pub struct IntensityImage {
    /// Pixels per side
    pub n: usize,
    /// Backing storage in row-major order, `n * n` values
    pub data: Vec<f64>,
}

impl IntensityImage {
    /// Construct a zero-initialized `n × n` buffer.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Wrap an existing row-major buffer; `None` when the length is not `n²`.
    pub fn from_vec(n: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == n * n).then_some(Self { n, data })
    }

    #[inline]
    pub fn idx(&self, row: usize, col: usize) -> usize {
        row * self.n + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[self.idx(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, v: f64) {
        let i = self.idx(row, col);
        self.data[i] = v;
    }

    /// Sum of all pixel values.
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Row/column of the largest finite value, if any.
    pub fn argmax(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.data.iter().enumerate() {
            if !v.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, b)| v > b) {
                best = Some((i, v));
            }
        }
        best.map(|(i, _)| (i / self.n, i % self.n))
    }

    pub fn has_non_finite(&self) -> bool {
        self.data.iter().any(|v| !v.is_finite())
    }
}

impl crate::image::traits::ImageView for IntensityImage {
    type Pixel = f64;

    #[inline]
    fn width(&self) -> usize {
        self.n
    }
    #[inline]
    fn height(&self) -> usize {
        self.n
    }
    #[inline]
    fn row(&self, y: usize) -> &[f64] {
        let start = y * self.n;
        &self.data[start..start + self.n]
    }
    #[inline]
    fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
