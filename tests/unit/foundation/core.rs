use super::*;

#[test]
fn dimensions_reject_zero_axes() {
    assert!(Dimensions::new(0, 10).is_err());
    assert!(Dimensions::new(10, 0).is_err());
    assert!(Dimensions::new(1, 1).is_ok());
}

#[test]
fn fit_inside_is_identity_when_already_fitting() {
    let image = Dimensions::new(300, 200).unwrap();
    let container = Dimensions::new(400, 300).unwrap();
    assert_eq!(image.fit_inside(container), image);
}

#[test]
fn fit_inside_binds_the_tight_axis() {
    let image = Dimensions::new(1920, 1080).unwrap();
    let container = Dimensions::new(400, 300).unwrap();
    let fitted = image.fit_inside(container);
    assert_eq!(fitted, Dimensions::new(400, 225).unwrap());

    let tall = Dimensions::new(1080, 1920).unwrap();
    let fitted = tall.fit_inside(container);
    assert_eq!(fitted, Dimensions::new(168, 300).unwrap());
}

#[test]
fn fit_inside_never_collapses_an_axis_to_zero() {
    let banner = Dimensions::new(10_000, 1).unwrap();
    let fitted = banner.fit_inside(Dimensions::new(5, 5).unwrap());
    assert_eq!(fitted, Dimensions::new(5, 1).unwrap());

    let pole = Dimensions::new(1, 10_000).unwrap();
    let fitted = pole.fit_inside(Dimensions::new(5, 5).unwrap());
    assert_eq!(fitted, Dimensions::new(1, 5).unwrap());
}

#[test]
fn fit_inside_preserves_aspect_ratio() {
    let image = Dimensions::new(4000, 3000).unwrap();
    let container = Dimensions::new(333, 333).unwrap();
    let fitted = image.fit_inside(container);
    assert!(fitted.width <= container.width && fitted.height <= container.height);
    assert!((fitted.aspect_ratio() - image.aspect_ratio()).abs() < 0.02);
}

#[test]
fn aspect_fit_scales_exactly_one_axis() {
    let wide_into_square = aspect_fit_matrix(2.0, 1.0);
    assert_eq!(wide_into_square.x_axis.x, 1.0);
    assert_eq!(wide_into_square.y_axis.y, 0.5);

    let square_into_wide = aspect_fit_matrix(1.0, 2.0);
    assert_eq!(square_into_wide.x_axis.x, 0.5);
    assert_eq!(square_into_wide.y_axis.y, 1.0);

    assert_eq!(aspect_fit_matrix(1.5, 1.5), Mat4::IDENTITY);
}

#[test]
fn invert_y_flips_only_the_vertical_axis() {
    let m = invert_y_matrix();
    assert_eq!(m.x_axis.x, 1.0);
    assert_eq!(m.y_axis.y, -1.0);
    assert_eq!(m.z_axis.z, 1.0);
}

#[test]
fn pixel_buffer_rejects_mismatched_length() {
    let dimensions = Dimensions::new(2, 2).unwrap();
    assert!(PixelBuffer::new(dimensions, vec![0; 15]).is_err());
    assert!(PixelBuffer::new(dimensions, vec![0; 16]).is_ok());
}

#[test]
fn pixel_buffer_converts_to_rgba_image() {
    let dimensions = Dimensions::new(3, 2).unwrap();
    let buffer = PixelBuffer::new(dimensions, vec![7; dimensions.byte_len()]).unwrap();
    let image = buffer.into_rgba_image().unwrap();
    assert_eq!(image.dimensions(), (3, 2));
    assert_eq!(image.get_pixel(2, 1).0, [7, 7, 7, 7]);
}

#[test]
fn dimensions_display_reads_as_width_by_height() {
    let dimensions = Dimensions::new(1920, 1080).unwrap();
    assert_eq!(dimensions.to_string(), "1920x1080");
}
