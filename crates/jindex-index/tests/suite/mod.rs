mod convert;
mod persistence;
mod round_trip;
