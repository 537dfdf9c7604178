// THEORY:
// The `Pixel` module is the smallest unit of the image path. A `Pixel` is a "dumb" data
// container for three 8-bit color channels; it knows nothing about its neighbors. Any
// alpha the codec sees is dropped on decode and re-synthesized as fully opaque on encode.
//
// `ChannelSum` is the matching accumulator: it adds pixels channel by channel into wide
// integers and divides by the number of pixels actually added, truncating toward zero.
// Each channel is handled identically and independently.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type ChannelTotal = u64;

    /// Channels carried per pixel in memory.
    pub const CHANNELS: usize = 3;
    /// Channels written per pixel by the encoder (RGB plus opaque alpha).
    pub const ENCODED_CHANNELS: usize = 4;
    pub const OPAQUE: Channel = Channel::MAX;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        pub const fn gray(level: Channel) -> Self {
            Self::new(level, level, level)
        }

        pub fn channels(&self) -> [Channel; CHANNELS] {
            [self.red, self.green, self.blue]
        }

        /// The pixel as encoder bytes, alpha fixed at fully opaque.
        pub fn to_rgba(&self) -> [Byte; ENCODED_CHANNELS] {
            [self.red, self.green, self.blue, OPAQUE]
        }
    }

    impl From<[Byte; CHANNELS]> for Pixel {
        fn from(bytes: [Byte; CHANNELS]) -> Self {
            Pixel::new(bytes[0], bytes[1], bytes[2])
        }
    }

    impl From<Pixel> for [Byte; CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            pixel.channels()
        }
    }

    /// Per-channel running totals over a set of pixels.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ChannelSum {
        pub red: ChannelTotal,
        pub green: ChannelTotal,
        pub blue: ChannelTotal,
        /// Number of pixels added so far.
        pub count: ChannelTotal,
    }

    impl ChannelSum {
        pub fn add(&mut self, pixel: &Pixel) {
            self.red += ChannelTotal::from(pixel.red);
            self.green += ChannelTotal::from(pixel.green);
            self.blue += ChannelTotal::from(pixel.blue);
            self.count += 1;
        }

        /// Integer mean of each channel, truncated. An empty sum averages to black.
        pub fn average(&self) -> Pixel {
            if self.count == 0 {
                return Pixel::default();
            }
            // A mean of u8 values always fits back into a u8.
            Pixel {
                red: (self.red / self.count) as Channel,
                green: (self.green / self.count) as Channel,
                blue: (self.blue / self.count) as Channel,
            }
        }
    }

    impl<'a> FromIterator<&'a Pixel> for ChannelSum {
        fn from_iter<I: IntoIterator<Item = &'a Pixel>>(iter: I) -> Self {
            let mut sum = ChannelSum::default();
            for pixel in iter {
                sum.add(pixel);
            }
            sum
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn average_truncates_toward_zero() {
        let pixels = [Pixel::new(10, 0, 255), Pixel::new(11, 1, 254)];
        let sum: ChannelSum = pixels.iter().collect();
        assert_eq!(sum.count, 2);
        // (21 / 2, 1 / 2, 509 / 2)
        assert_eq!(sum.average(), Pixel::new(10, 0, 254));
    }

    #[test]
    fn channels_are_independent() {
        let pixels = [Pixel::new(255, 0, 0), Pixel::new(0, 255, 0), Pixel::new(0, 0, 255)];
        let sum: ChannelSum = pixels.iter().collect();
        assert_eq!(sum.average(), Pixel::new(85, 85, 85));
    }

    #[test]
    fn empty_sum_is_black() {
        assert_eq!(ChannelSum::default().average(), Pixel::default());
    }

    #[test]
    fn rgba_alpha_is_opaque() {
        assert_eq!(Pixel::new(1, 2, 3).to_rgba(), [1, 2, 3, 255]);
        let bytes: [u8; 3] = Pixel::from([4, 5, 6]).into();
        assert_eq!(bytes, [4, 5, 6]);
    }
}
