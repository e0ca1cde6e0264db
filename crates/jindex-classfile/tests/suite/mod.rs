mod binary_view;
mod parse_class;
