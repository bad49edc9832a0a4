// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Synthetic square-grid network for the end-to-end scenarios: points on
//! a coarse grid, and shuttle legs bouncing between each neighbouring
//! pair for the whole time window.

use chrono::{Duration, NaiveDateTime};
use stopover::models::{Point, Travel};

pub struct GridGenerator {
    n: usize,
    square_size: f64,
}

impl GridGenerator {
    /// `n` is the raw grid resolution; only even rows and columns carry a
    /// point, so `n = 5` yields a 3x3 grid with spacing `2 * square_size`.
    pub fn new(n: usize, square_size: f64) -> GridGenerator {
        GridGenerator { n, square_size }
    }

    /// Points in row-major order with sequential ids starting at "1".
    pub fn generate_points(&self) -> Vec<Point> {
        let mut points = Vec::new();
        let mut next_id = 1usize;

        for i in (0..self.n).step_by(2) {
            for j in (0..self.n).step_by(2) {
                points.push(Point {
                    id: next_id.to_string(),
                    x: self.square_size * j as f64,
                    y: self.square_size * i as f64,
                    name: format!("grid point {}", next_id),
                });
                next_id += 1;
            }
        }

        points
    }

    /// Horizontal, vertical and diagonal neighbour pairs, each once, with
    /// the lower-id point first.
    pub fn neighbour_pairs<'a>(&self, points: &'a [Point]) -> Vec<(&'a Point, &'a Point)> {
        let side = self.n.div_ceil(2);
        let mut pairs = Vec::new();

        for (index, point) in points.iter().enumerate() {
            let row = index / side;
            let col = index % side;

            // right, down, and both down-diagonals cover every pair once
            let mut candidates = Vec::new();
            if col + 1 < side {
                candidates.push(index + 1);
            }
            if row + 1 < side {
                candidates.push(index + side);
                if col + 1 < side {
                    candidates.push(index + side + 1);
                }
                if col > 0 {
                    candidates.push(index + side - 1);
                }
            }

            for other in candidates {
                pairs.push((point, &points[other]));
            }
        }

        pairs
    }

    /// Shuttle legs for every neighbour pair: the vehicle departs from
    /// the lower-id point at the window start, rests `rest_hours` after
    /// each arrival, and alternates direction until a leg would arrive
    /// past the window end.
    pub fn generate_travels(
        &self,
        points: &[Point],
        from: NaiveDateTime,
        to: NaiveDateTime,
        speed: f64,
        rest_hours: i64,
    ) -> Vec<Travel> {
        let mut travels = Vec::new();

        for (a, b) in self.neighbour_pairs(points) {
            let distance = a.calculate_distance(b);
            let leg_duration = Duration::seconds((distance / speed * 3600.0).round() as i64);
            let rest = Duration::hours(rest_hours);

            let mut departure = from;
            let mut outbound = true;
            loop {
                let arrival = departure + leg_duration;
                if arrival > to {
                    break;
                }

                let (leg_from, leg_to) = if outbound { (a, b) } else { (b, a) };
                travels.push(Travel::new(
                    format!("{}-{}-{}", leg_from.id, leg_to.id, departure.format("%Y%m%d%H%M%S")),
                    leg_from.id.clone(),
                    leg_to.id.clone(),
                    departure,
                    arrival,
                ));

                departure = arrival + rest;
                outbound = !outbound;
            }
        }

        travels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> (NaiveDateTime, NaiveDateTime) {
        let from = NaiveDate::from_ymd_opt(2027, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (from, from + Duration::hours(24))
    }

    #[test]
    fn three_by_three_grid_has_nine_points() {
        let generator = GridGenerator::new(5, 1000.0);
        let points = generator.generate_points();
        assert_eq!(points.len(), 9);
        assert_eq!(points[0].id, "1");
        assert_eq!((points[0].x, points[0].y), (0.0, 0.0));
        assert_eq!((points[4].x, points[4].y), (2000.0, 2000.0));
        assert_eq!(points[8].id, "9");
        assert_eq!((points[8].x, points[8].y), (4000.0, 4000.0));
    }

    #[test]
    fn grid_has_twelve_straight_and_eight_diagonal_pairs() {
        let generator = GridGenerator::new(5, 1000.0);
        let points = generator.generate_points();
        let pairs = generator.neighbour_pairs(&points);

        let straight = pairs
            .iter()
            .filter(|(a, b)| a.x == b.x || a.y == b.y)
            .count();
        let diagonal = pairs.len() - straight;
        assert_eq!(straight, 12);
        assert_eq!(diagonal, 8);
    }

    /// 12 straight pairs produce 6 legs each (2h flight + 2h rest in a
    /// 24h window) and 8 diagonal pairs produce 5, for 112 legs total.
    #[test]
    fn one_day_window_yields_112_legs() {
        let generator = GridGenerator::new(5, 1000.0);
        let points = generator.generate_points();
        let (from, to) = window();
        let travels = generator.generate_travels(&points, from, to, 1000.0, 2);
        assert_eq!(travels.len(), 112);
    }

    #[test]
    fn first_leg_of_a_straight_pair_matches_the_direct_scenario() {
        let generator = GridGenerator::new(5, 1000.0);
        let points = generator.generate_points();
        let (from, to) = window();
        let travels = generator.generate_travels(&points, from, to, 1000.0, 2);

        let leg = travels
            .iter()
            .find(|t| t.from_point == "1" && t.to_point == "2")
            .unwrap();
        assert_eq!(leg.departure, from);
        assert_eq!(leg.arrival, from + Duration::hours(2));
    }

    #[test]
    fn shuttle_alternates_direction() {
        let generator = GridGenerator::new(5, 1000.0);
        let points = generator.generate_points();
        let (from, to) = window();
        let travels = generator.generate_travels(&points, from, to, 1000.0, 2);

        let mut pair_legs: Vec<&Travel> = travels
            .iter()
            .filter(|t| {
                (t.from_point == "1" && t.to_point == "2")
                    || (t.from_point == "2" && t.to_point == "1")
            })
            .collect();
        pair_legs.sort_by_key(|t| t.departure);

        assert_eq!(pair_legs.len(), 6);
        assert_eq!(pair_legs[0].from_point, "1");
        assert_eq!(pair_legs[1].from_point, "2");
        assert_eq!(pair_legs[2].from_point, "1");
        // consecutive legs chain: next departs where the previous landed
        for pair in pair_legs.windows(2) {
            assert_eq!(pair[0].to_point, pair[1].from_point);
            assert_eq!(pair[1].departure, pair[0].arrival + Duration::hours(2));
        }
    }

    #[test]
    fn all_legs_arrive_inside_the_window() {
        let generator = GridGenerator::new(5, 1000.0);
        let points = generator.generate_points();
        let (from, to) = window();
        let travels = generator.generate_travels(&points, from, to, 1000.0, 2);
        for travel in &travels {
            assert!(travel.departure >= from);
            assert!(travel.arrival <= to);
            assert!(travel.arrival > travel.departure);
        }
    }
}
