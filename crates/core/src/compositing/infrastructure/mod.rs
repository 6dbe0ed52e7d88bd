pub mod alpha_blend_compositor;
