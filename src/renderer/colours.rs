use image::Rgba;

pub(crate) struct Colours {
    pub background: Rgba<u8>,
    pub header: Rgba<u8>,
    pub text: Rgba<u8>,
    pub axis: Rgba<u8>,
    pub grid: Rgba<u8>,
    pub separator: Rgba<u8>,
}

impl Default for Colours {
    fn default() -> Self {
        Self {
            background: Rgba([0, 0, 0, 255]),
            header: Rgba([114, 159, 207, 255]),   // Steel blue
            text: Rgba([238, 238, 236, 255]),     // Off-white
            axis: Rgba([186, 189, 182, 255]),     // Silver gray
            grid: Rgba([45, 45, 45, 255]),
            separator: Rgba([60, 60, 60, 255]),
        }
    }
}

const SERIES: [Rgba<u8>; 8] = [
    Rgba([87, 174, 36, 255]),   // Vibrant green
    Rgba([245, 121, 0, 255]),   // Burnt orange
    Rgba([0, 188, 212, 255]),   // Cyan
    Rgba([204, 0, 0, 255]),     // Crimson
    Rgba([237, 212, 0, 255]),   // Golden yellow
    Rgba([173, 127, 168, 255]), // Lavender
    Rgba([52, 101, 164, 255]),  // Royal blue
    Rgba([233, 185, 110, 255]), // Sand
];

/// Line colour for the sensor at `index` in table order.
pub fn series(index: usize) -> Rgba<u8> {
    SERIES[index % SERIES.len()]
}
